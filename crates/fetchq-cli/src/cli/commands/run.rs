//! `fetchq run` – process the pending links of the saved queue.

use anyhow::Result;
use fetchq_core::config::FetchqConfig;
use fetchq_core::resolver::PageResolver;
use fetchq_core::scheduler::ProgressSnapshot;
use fetchq_core::session::{SessionError, SessionStore};
use fetchq_core::{EngineControl, EngineEvent, Queue, QueueProcessor, RunSummary};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::load_queue;
use crate::cli::control_socket;

fn format_progress(p: &ProgressSnapshot) -> String {
    let done_mib = p.bytes_downloaded as f64 / 1_048_576.0;
    let rate_mib = p.rate_bytes_per_sec / 1_048_576.0;
    match p.fraction() {
        Some(f) => {
            let eta = p
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}",
                done_mib,
                p.total_bytes as f64 / 1_048_576.0,
                f * 100.0,
                rate_mib,
                eta
            )
        }
        None => format!("  {:.1} MiB  {:.2} MiB/s", done_mib, rate_mib),
    }
}

/// Minimum gap between printed progress lines.
const PROGRESS_PRINT_INTERVAL: Duration = Duration::from_millis(500);

/// Prints events until every sender is gone.
async fn print_events(mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
    let mut last_progress: Option<Instant> = None;
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::Log(line) => println!("{}", line),
            EngineEvent::FileProgress(p) => {
                let done = p.fraction() == Some(1.0);
                let due = last_progress.map_or(true, |t| t.elapsed() >= PROGRESS_PRINT_INTERVAL);
                if done || due {
                    last_progress = Some(Instant::now());
                    println!("{}", format_progress(&p));
                }
            }
            EngineEvent::OverallProgress { completed, total } => {
                println!("[{}/{}]", completed, total)
            }
            EngineEvent::FileInfo { .. }
            | EngineEvent::Speed { .. }
            | EngineEvent::ItemStarted { .. }
            | EngineEvent::ItemCompleted { .. }
            | EngineEvent::ItemFailed { .. } => {}
        }
    }
}

/// Runs `work` over `queue` on the blocking pool. The queue stays readable
/// afterwards even when `work` panicked.
async fn process_blocking<F>(queue: Arc<Mutex<Queue>>, work: F) -> Result<RunSummary, JoinError>
where
    F: FnOnce(&mut Queue) -> RunSummary + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
        work(&mut queue)
    })
    .await
}

/// Writes the queue's statuses back, merged with whatever was added to the
/// session file during the run.
fn save_session(store: &SessionStore, queue: &Mutex<Queue>) -> Result<(), SessionError> {
    let records = queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .to_records();
    store.save_merged(&records)
}

pub async fn run_queue(cfg: &FetchqConfig, download_dir: PathBuf) -> Result<()> {
    let (store, queue, warning) = load_queue()?;
    if queue.pending_indices().is_empty() {
        if let Some(w) = &warning {
            eprintln!("warning: {}", w);
        }
        println!("No pending links.");
        return Ok(());
    }

    let control = Arc::new(EngineControl::with_poll_interval(cfg.pause_poll()));
    let (tx, rx) = mpsc::unbounded_channel::<EngineEvent>();
    let printer = tokio::spawn(print_events(rx));
    if let Some(w) = warning {
        let _ = tx.send(EngineEvent::Log(format!("warning: {}", w)));
    }

    let socket_path = control_socket::default_socket_path().ok();
    let listener = socket_path.as_ref().and_then(|path| {
        match control_socket::spawn_control_listener(Arc::clone(&control), tx.clone(), path) {
            Ok(h) => {
                tracing::debug!(path = %path.display(), "control socket listening");
                Some(h)
            }
            Err(e) => {
                tracing::warn!("control socket unavailable: {:#}", e);
                None
            }
        }
    });

    let ctrl_c = {
        let control = Arc::clone(&control);
        let tx = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                control.stop();
                let _ = tx.send(EngineEvent::Log("stopping...".to_string()));
            }
        })
    };

    let processor = QueueProcessor::from_config(
        cfg,
        Arc::new(PageResolver::from_config(cfg)),
        Arc::clone(&control),
        download_dir,
    );
    let observer = tx.clone();
    let queue = Arc::new(Mutex::new(queue));
    let run = process_blocking(Arc::clone(&queue), move |queue| {
        processor.run(queue, &observer)
    })
    .await;

    ctrl_c.abort();
    if let Some(h) = listener {
        h.abort();
    }
    if let Some(path) = &socket_path {
        let _ = std::fs::remove_file(path);
    }

    if let Err(e) = save_session(&store, &queue) {
        tracing::warn!("could not save session: {}", e);
        let _ = tx.send(EngineEvent::Log(format!("could not save session: {}", e)));
    }
    let summary = match run {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("queue processor aborted: {}", e);
            let _ = tx.send(EngineEvent::Log(format!("queue processor aborted: {}", e)));
            drop(tx);
            let _ = printer.await;
            anyhow::bail!("queue processor aborted: {}", e);
        }
    };
    drop(tx);
    let _ = printer.await;

    tracing::info!(
        completed = summary.completed,
        failed = summary.failed,
        stopped = summary.stopped,
        "run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchq_core::session::{SessionRecord, SessionStatus};

    fn rec(status: SessionStatus, link: &str) -> SessionRecord {
        SessionRecord {
            status,
            link: link.to_string(),
        }
    }

    #[test]
    fn progress_line_with_and_without_size() {
        let known = ProgressSnapshot {
            bytes_downloaded: 1_048_576,
            total_bytes: 4 * 1_048_576,
            rate_bytes_per_sec: 1_048_576.0,
        };
        assert_eq!(
            format_progress(&known),
            "  1.0 / 4.0 MiB (25.0%)  1.00 MiB/s  ETA 3s"
        );
        let unknown = ProgressSnapshot {
            total_bytes: 0,
            ..known
        };
        assert_eq!(format_progress(&unknown), "  1.0 MiB  1.00 MiB/s");
    }

    #[tokio::test]
    async fn queue_is_saved_even_when_processing_panics() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let initial = vec![
            rec(SessionStatus::Completed, "https://p.example/done"),
            rec(SessionStatus::Pending, "https://p.example/next"),
        ];
        store.save(&initial).unwrap();

        let queue = Arc::new(Mutex::new(Queue::from_records(&initial)));
        let run = process_blocking(Arc::clone(&queue), |queue| {
            queue.push_link("https://p.example/seen-mid-run");
            panic!("processor blew up");
        })
        .await;
        assert!(run.unwrap_err().is_panic());

        // A link another process queued while this run was going.
        let mut on_disk = store.load().unwrap();
        on_disk.push(rec(SessionStatus::Pending, "https://p.example/added"));
        store.save(&on_disk).unwrap();

        save_session(&store, &queue).unwrap();
        let links: Vec<String> = store.load().unwrap().into_iter().map(|r| r.link).collect();
        assert_eq!(
            links,
            vec![
                "https://p.example/done",
                "https://p.example/next",
                "https://p.example/seen-mid-run",
                "https://p.example/added",
            ]
        );
    }
}
