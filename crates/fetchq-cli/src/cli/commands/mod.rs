//! CLI command handlers, one file per command.

mod add;
mod clear;
mod completions;
mod control;
mod run;
mod status;

pub use add::run_add;
pub use clear::run_clear;
pub use completions::{run_completions, run_man};
pub use control::{run_control, ControlCommand};
pub use run::run_queue;
pub use status::run_status;

use anyhow::Result;
use fetchq_core::session::SessionStore;
use fetchq_core::Queue;

/// Opens the default session store and restores the queue from it.
///
/// An unreadable session yields an empty queue plus a warning the caller
/// must show; a corrupt file has already been moved aside by then.
pub(crate) fn load_queue() -> Result<(SessionStore, Queue, Option<String>)> {
    let store = SessionStore::open_default()?;
    let (records, warning) = store.load_or_recover();
    Ok((store, Queue::from_records(&records), warning))
}
