//! Events pushed from the engine to whatever renders them.
//!
//! The core never assumes how (or whether) events are displayed; it only
//! calls `Observer::notify`. Channel senders implement `Observer` so a front
//! end can consume events on its own thread or task.

use std::sync::Mutex;

use crate::scheduler::ProgressSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Human-readable log line.
    Log(String),
    /// Bytes transferred so far for the active item.
    FileProgress(ProgressSnapshot),
    /// Items finished (completed or failed) out of the items in this run.
    OverallProgress { completed: usize, total: usize },
    /// Resolved name and probed size of the active item.
    FileInfo { file_name: String, total_size: u64 },
    /// Smoothed transfer rate, emitted at a throttled interval.
    Speed { bytes_per_sec: f64 },
    ItemStarted { source_url: String },
    ItemCompleted { source_url: String },
    ItemFailed { source_url: String, reason: String },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: EngineEvent);
}

impl Observer for std::sync::mpsc::Sender<EngineEvent> {
    fn notify(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

impl Observer for tokio::sync::mpsc::UnboundedSender<EngineEvent> {
    fn notify(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

/// Keeps every event in memory; handy for tests and post-run summaries.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: EngineEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_sender_forwards_events() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.notify(EngineEvent::Log("hello".into()));
        assert_eq!(rx.recv().unwrap(), EngineEvent::Log("hello".into()));
    }

    #[test]
    fn sender_ignores_closed_channel() {
        let (tx, rx) = std::sync::mpsc::channel::<EngineEvent>();
        drop(rx);
        tx.notify(EngineEvent::Speed { bytes_per_sec: 1.0 });
    }

    #[test]
    fn recording_observer_filters_logs() {
        let obs = RecordingObserver::new();
        obs.notify(EngineEvent::Log("a".into()));
        obs.notify(EngineEvent::OverallProgress {
            completed: 1,
            total: 2,
        });
        obs.notify(EngineEvent::Log("b".into()));
        assert_eq!(obs.events().len(), 3);
        assert_eq!(obs.logs(), vec!["a".to_string(), "b".to_string()]);
    }
}
