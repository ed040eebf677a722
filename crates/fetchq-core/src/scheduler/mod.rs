//! Queue scheduling and per-item orchestration.
//!
//! `QueueProcessor` walks the queue sequentially; `DownloadEngine` takes one
//! item through resolve → probe → transfer; `progress` turns raw byte counts
//! into throttled observer events.

mod choose;
mod engine;
mod progress;
mod queue;

pub use choose::{choose_strategy, TransferStrategy};
pub use engine::{DownloadEngine, ItemOutcome, TransferTarget};
pub use progress::{ProgressReporter, ProgressSnapshot, SpeedMeter};
pub use queue::{ItemStatus, Queue, QueueItem, QueueProcessor, RunSummary};
