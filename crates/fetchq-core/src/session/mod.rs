//! Session persistence: the queue as an ordered JSON array of `{status, link}`.
//!
//! Statuses are stored as the icons the queue display uses, so the file is
//! readable (and diffable) by hand. Written on normal shutdown and on clear,
//! read back on startup.

mod store;

pub use store::{SessionError, SessionStore};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[serde(rename = "🕒")]
    Pending,
    #[serde(rename = "➡️")]
    Active,
    #[serde(rename = "✅")]
    Completed,
    #[serde(rename = "❌")]
    Failed,
}

impl SessionStatus {
    pub fn icon(self) -> &'static str {
        match self {
            SessionStatus::Pending => "🕒",
            SessionStatus::Active => "➡️",
            SessionStatus::Completed => "✅",
            SessionStatus::Failed => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub status: SessionStatus,
    pub link: String,
}

/// The records of a finished run, followed by any records another writer
/// added to the file while it ran. Links the run knows keep the run's status.
pub fn merge_records(run: &[SessionRecord], on_disk: &[SessionRecord]) -> Vec<SessionRecord> {
    let known: HashSet<&str> = run.iter().map(|r| r.link.as_str()).collect();
    let mut merged = run.to_vec();
    merged.extend(
        on_disk
            .iter()
            .filter(|r| !known.contains(r.link.as_str()))
            .cloned(),
    );
    merged
}
