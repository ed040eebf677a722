//! Queue model and the sequential QueueProcessor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchqConfig;
use crate::control::EngineControl;
use crate::events::{EngineEvent, Observer};
use crate::resolver::Resolver;
use crate::session::{SessionRecord, SessionStatus};

use super::engine::DownloadEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl ItemStatus {
    /// Completed and Failed never change again without operator action.
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }
}

impl From<ItemStatus> for SessionStatus {
    fn from(s: ItemStatus) -> Self {
        match s {
            ItemStatus::Pending => SessionStatus::Pending,
            ItemStatus::Active => SessionStatus::Active,
            ItemStatus::Completed => SessionStatus::Completed,
            ItemStatus::Failed => SessionStatus::Failed,
        }
    }
}

/// Restoring a session: an item that was Active when the process ended is Pending again.
impl From<SessionStatus> for ItemStatus {
    fn from(s: SessionStatus) -> Self {
        match s {
            SessionStatus::Pending | SessionStatus::Active => ItemStatus::Pending,
            SessionStatus::Completed => ItemStatus::Completed,
            SessionStatus::Failed => ItemStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Identity within the queue.
    pub source_url: String,
    pub status: ItemStatus,
    /// Local file name, once known.
    pub display_name: Option<String>,
}

impl QueueItem {
    pub fn pending(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            status: ItemStatus::Pending,
            display_name: None,
        }
    }
}

/// Ordered items with unique source URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending items for each link, in order, skipping blanks and duplicates.
    pub fn from_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut q = Self::new();
        for link in links {
            q.push_link(link.as_ref());
        }
        q
    }

    pub fn from_records(records: &[SessionRecord]) -> Self {
        let mut q = Self::new();
        for r in records {
            let link = r.link.trim();
            if link.is_empty() || q.contains(link) {
                continue;
            }
            q.items.push(QueueItem {
                source_url: link.to_string(),
                status: r.status.into(),
                display_name: None,
            });
        }
        q
    }

    pub fn to_records(&self) -> Vec<SessionRecord> {
        self.items
            .iter()
            .map(|item| SessionRecord {
                status: item.status.into(),
                link: item.source_url.clone(),
            })
            .collect()
    }

    /// Appends a Pending item. Returns false if the link is blank or already queued.
    pub fn push_link(&mut self, link: &str) -> bool {
        let link = link.trim();
        if link.is_empty() || self.contains(link) {
            return false;
        }
        self.items.push(QueueItem::pending(link));
        true
    }

    pub fn contains(&self, source_url: &str) -> bool {
        self.get(source_url).is_some()
    }

    pub fn get(&self, source_url: &str) -> Option<&QueueItem> {
        self.items.iter().find(|i| i.source_url == source_url)
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Indices of the items a run would process, in order.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.status == ItemStatus::Pending)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Counts for one `QueueProcessor::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Stop was requested before every pending item was processed.
    pub stopped: bool,
}

/// Drives the queue one item at a time, in order.
pub struct QueueProcessor {
    engine: DownloadEngine,
    download_dir: PathBuf,
    pacing_delay: Duration,
}

impl QueueProcessor {
    pub fn new(engine: DownloadEngine, download_dir: impl Into<PathBuf>, pacing_delay: Duration) -> Self {
        Self {
            engine,
            download_dir: download_dir.into(),
            pacing_delay,
        }
    }

    pub fn from_config(
        cfg: &FetchqConfig,
        resolver: Arc<dyn Resolver>,
        control: Arc<EngineControl>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            DownloadEngine::new(cfg, resolver, control),
            download_dir,
            cfg.pacing_delay(),
        )
    }

    pub fn control(&self) -> &Arc<EngineControl> {
        self.engine.control()
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Processes every Pending item of `queue`.
    ///
    /// Each item goes Active, then Completed or Failed; one failure never
    /// stops the run. A stop request ends the run before the next item: the
    /// item in flight is recorded Failed (unless it had already finished) and
    /// the rest stay Pending.
    pub fn run(&self, queue: &mut Queue, observer: &dyn Observer) -> RunSummary {
        let control = self.engine.control();
        let pending = queue.pending_indices();
        let mut summary = RunSummary {
            total: pending.len(),
            ..RunSummary::default()
        };

        observer.notify(EngineEvent::Log(format!(
            "session started: {} link(s) to process",
            summary.total
        )));
        tracing::info!(total = summary.total, dir = %self.download_dir.display(), "queue run started");

        for (n, &idx) in pending.iter().enumerate() {
            if n > 0 && control.sleep(self.pacing_delay).is_err() {
                summary.stopped = true;
                break;
            }
            if !control.is_active() {
                summary.stopped = true;
                break;
            }

            let source_url = queue.items[idx].source_url.clone();
            queue.items[idx].status = ItemStatus::Active;
            observer.notify(EngineEvent::ItemStarted {
                source_url: source_url.clone(),
            });
            observer.notify(EngineEvent::Log(format!(
                "Processing link {}/{}: {}",
                n + 1,
                summary.total,
                source_url
            )));

            match self.engine.process_item(&source_url, &self.download_dir, observer) {
                Ok(outcome) => {
                    let item = &mut queue.items[idx];
                    item.status = ItemStatus::Completed;
                    item.display_name = Some(outcome.target.file_name.clone());
                    summary.completed += 1;
                    tracing::info!(
                        url = %source_url,
                        path = %outcome.path.display(),
                        bytes = outcome.bytes,
                        "item completed"
                    );
                    observer.notify(EngineEvent::ItemCompleted {
                        source_url: source_url.clone(),
                    });
                    observer.notify(EngineEvent::Log(format!(
                        "Finished: {}",
                        outcome.target.file_name
                    )));
                }
                Err(e) => {
                    queue.items[idx].status = ItemStatus::Failed;
                    summary.failed += 1;
                    if e.is_cancelled() {
                        summary.stopped = true;
                        tracing::info!(url = %source_url, "item stopped by user");
                        observer.notify(EngineEvent::Log("stopped by user".to_string()));
                    } else {
                        tracing::warn!(url = %source_url, "item failed: {}", e);
                        observer.notify(EngineEvent::Log(format!(
                            "Error on link {}: {}",
                            n + 1,
                            e
                        )));
                    }
                    observer.notify(EngineEvent::ItemFailed {
                        source_url: source_url.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            observer.notify(EngineEvent::OverallProgress {
                completed: summary.completed + summary.failed,
                total: summary.total,
            });

            if summary.stopped {
                break;
            }
        }

        let left = summary.total - summary.completed - summary.failed;
        observer.notify(EngineEvent::Log(format!(
            "session finished: {} completed, {} failed, {} not started",
            summary.completed, summary.failed, left
        )));
        tracing::info!(?summary, "queue run finished");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_links_dedupes_and_trims() {
        let q = Queue::from_links([
            "https://example.com/a",
            " https://example.com/a ",
            "",
            "https://example.com/b",
        ]);
        let urls: Vec<_> = q.items().iter().map(|i| i.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert!(q.items().iter().all(|i| i.status == ItemStatus::Pending));
    }

    #[test]
    fn records_roundtrip_except_active() {
        let mut q = Queue::from_links(["https://e/1", "https://e/2", "https://e/3", "https://e/4"]);
        q.items[0].status = ItemStatus::Completed;
        q.items[1].status = ItemStatus::Failed;
        q.items[2].status = ItemStatus::Active;

        let records = q.to_records();
        assert_eq!(records[2].status, SessionStatus::Active);

        let restored = Queue::from_records(&records);
        let statuses: Vec<_> = restored.items().iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Completed,
                ItemStatus::Failed,
                ItemStatus::Pending,
                ItemStatus::Pending
            ]
        );
        assert_eq!(restored.pending_indices(), vec![2, 3]);
    }

    #[test]
    fn terminal_statuses() {
        assert!(ItemStatus::Completed.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
        assert!(!ItemStatus::Pending.is_terminal());
        assert!(!ItemStatus::Active.is_terminal());
    }

    #[test]
    fn push_link_reports_duplicates() {
        let mut q = Queue::new();
        assert!(q.push_link("https://e/1"));
        assert!(!q.push_link("https://e/1"));
        assert_eq!(q.len(), 1);
        q.clear();
        assert!(q.is_empty());
    }
}
