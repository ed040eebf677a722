//! Chunk retry policy.
//!
//! Decides whether a failed chunk gets another attempt. The policy is a
//! fixed delay with a hard attempt cap; every transport or response failure
//! is retried, only local storage failures are not.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::classify;
pub use error::ChunkError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
