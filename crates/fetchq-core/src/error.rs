//! Item-level error taxonomy.
//!
//! Every failure while processing one queue item ends up as an `EngineError`.
//! The queue processor records it as the item's terminal `Failed` status and
//! moves on; nothing here aborts a whole session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Page unreachable, non-success status, or no direct URL in the page.
    #[error("resolution failed: {reason}")]
    ResolutionFailed { reason: String },
    /// Size / range-support probe on the direct URL failed.
    #[error("probe failed: {reason}")]
    ProbeFailed { reason: String },
    /// Stream transport error, or chunks still missing after all retries.
    #[error("transfer failed: {reason}")]
    TransferFailed { reason: String },
    /// Local file could not be created, written or renamed.
    #[error("storage error: {reason}")]
    Storage { reason: String },
    /// Operator stop observed mid-item.
    #[error("stopped by user")]
    Cancelled,
}

impl EngineError {
    pub fn resolution(reason: impl std::fmt::Display) -> Self {
        EngineError::ResolutionFailed {
            reason: reason.to_string(),
        }
    }

    pub fn probe(reason: impl std::fmt::Display) -> Self {
        EngineError::ProbeFailed {
            reason: reason.to_string(),
        }
    }

    pub fn transfer(reason: impl std::fmt::Display) -> Self {
        EngineError::TransferFailed {
            reason: reason.to_string(),
        }
    }

    /// Storage errors come from `anyhow` chains; keep the whole chain in the reason.
    pub fn storage(err: &anyhow::Error) -> Self {
        EngineError::Storage {
            reason: format!("{:#}", err),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
