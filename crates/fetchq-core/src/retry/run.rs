//! Retry loop: pause/stop checkpoint, attempt, fixed backoff.

use super::classify;
use super::error::ChunkError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::EngineControl;

/// Runs `f` until it succeeds or the policy gives up.
///
/// Before every attempt the control state is checked: a paused worker blocks
/// there (its previous request, if any, has already finished) and a stopped
/// one returns `ChunkError::Cancelled` without issuing another request. The
/// backoff sleep is cut short by stop as well.
pub fn run_with_retry<F>(
    policy: &RetryPolicy,
    control: &EngineControl,
    mut f: F,
) -> Result<(), ChunkError>
where
    F: FnMut(u32) -> Result<(), ChunkError>,
{
    let mut attempt = 1u32;
    loop {
        if control.checkpoint().is_err() {
            return Err(ChunkError::Cancelled);
        }
        match f(attempt) {
            Ok(()) => return Ok(()),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, "chunk attempt failed: {}; retrying", e);
                        if control.sleep(d).is_err() {
                            return Err(ChunkError::Cancelled);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
