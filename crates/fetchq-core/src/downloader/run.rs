//! RangeScheduler: bounded worker pool over the chunk plan.

use std::collections::VecDeque;
use std::sync::{mpsc, Mutex, PoisonError};

use super::chunk::download_one_chunk;
use super::TransferOptions;
use crate::control::EngineControl;
use crate::error::EngineError;
use crate::retry::{run_with_retry, ChunkError};
use crate::scheduler::ProgressReporter;
use crate::segmenter::{plan_chunks, ChunkBitmap, ChunkTask};
use crate::storage::StorageWriter;

/// How many missing offsets a failure message lists before eliding.
const MISSING_LISTED: usize = 8;

/// Downloads `[0, total_size)` of `url` into `storage`, which must already be
/// preallocated to `total_size`.
///
/// Workers pull tasks from a shared queue and retry each under
/// `opts.retry`. Every worker checks the control state before pulling a task
/// and before each attempt, so pause holds back new requests and stop drops
/// the tasks not yet started. Chunk completions are added to `progress`.
///
/// Returns `Ok` only when every chunk landed; a stop that arrives after the
/// last chunk finished does not undo that.
pub fn download_ranged(
    url: &str,
    opts: &TransferOptions,
    storage: &StorageWriter,
    total_size: u64,
    control: &EngineControl,
    progress: &mut ProgressReporter<'_>,
) -> Result<(), EngineError> {
    let tasks = plan_chunks(total_size, opts.chunk_size);
    let mut bitmap = ChunkBitmap::new(tasks.len());
    if tasks.is_empty() {
        return Ok(());
    }
    tracing::debug!(
        url,
        total_size,
        chunks = tasks.len(),
        workers = opts.max_workers.min(tasks.len()),
        "starting ranged download"
    );

    let work: Mutex<VecDeque<(usize, ChunkTask)>> =
        Mutex::new(tasks.iter().copied().enumerate().collect());
    let (tx, rx) = mpsc::channel::<(usize, Result<(), ChunkError>)>();
    let num_workers = opts.max_workers.min(tasks.len());

    let mut storage_error: Option<anyhow::Error> = None;
    let mut cancelled = false;
    let mut worker_panicked = false;

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            handles.push(scope.spawn(move || loop {
                if !control.is_active() {
                    break;
                }
                let next = work.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                let Some((index, task)) = next else {
                    break;
                };
                let res = run_with_retry(&opts.retry, control, |attempt| {
                    tracing::trace!(offset = task.offset, attempt, "chunk attempt");
                    download_one_chunk(url, opts, &task, storage)
                });
                if tx.send((index, res)).is_err() {
                    break;
                }
            }));
        }
        drop(tx);

        for (index, res) in rx {
            let task = tasks[index];
            match res {
                Ok(()) => {
                    bitmap.set_completed(index);
                    progress.add(task.len());
                }
                Err(ChunkError::Cancelled) => cancelled = true,
                Err(ChunkError::Storage(e)) => {
                    tracing::error!(offset = task.offset, "chunk write failed: {:#}", e);
                    // Disk trouble hits every worker; drop the rest of the plan.
                    work.lock().unwrap_or_else(PoisonError::into_inner).clear();
                    if storage_error.is_none() {
                        storage_error = Some(e);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        offset = task.offset,
                        len = task.len(),
                        "chunk failed after {} attempts: {}",
                        opts.retry.max_attempts,
                        e
                    );
                }
            }
        }

        for h in handles {
            if h.join().is_err() {
                worker_panicked = true;
            }
        }
    });

    if bitmap.all_completed() {
        return Ok(());
    }
    if let Some(e) = storage_error {
        return Err(EngineError::storage(&e));
    }
    if cancelled || !control.is_active() {
        return Err(EngineError::Cancelled);
    }
    if worker_panicked {
        return Err(EngineError::transfer("chunk worker panicked"));
    }

    let missing = bitmap.missing();
    let mut listed: Vec<String> = missing
        .iter()
        .take(MISSING_LISTED)
        .map(|&i| tasks[i].offset.to_string())
        .collect();
    if missing.len() > MISSING_LISTED {
        listed.push("...".to_string());
    }
    Err(EngineError::transfer(format!(
        "{} of {} chunks missing after retries (offsets {})",
        missing.len(),
        tasks.len(),
        listed.join(", ")
    )))
}
