//! One byte-range GET written at the chunk's offset.

use std::cell::Cell;

use super::{configure, parse_status_line, TransferOptions};
use crate::retry::ChunkError;
use crate::segmenter::ChunkTask;
use crate::storage::StorageWriter;

/// Fetches `task` with a `Range` request and writes the body at `task.offset`.
///
/// Only a `206` body is written; anything else, or a body that is shorter or
/// longer than the span, fails the attempt so the retry loop can decide.
pub(super) fn download_one_chunk(
    url: &str,
    opts: &TransferOptions,
    task: &ChunkTask,
    storage: &StorageWriter,
) -> Result<(), ChunkError> {
    let expected = task.len();
    let status = Cell::new(0u32);
    let received = Cell::new(0u64);
    let mut storage_error: Option<anyhow::Error> = None;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts).map_err(ChunkError::Curl)?;
    easy.range(&task.range_spec()).map_err(ChunkError::Curl)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                if let Some(code) = parse_status_line(line) {
                    status.set(code);
                }
                true
            })
            .map_err(ChunkError::Curl)?;
        transfer
            .write_function(|data| {
                if status.get() != 206 {
                    return Ok(0);
                }
                let off = received.get();
                let end = off + data.len() as u64;
                if end > expected {
                    received.set(end);
                    return Ok(0);
                }
                if let Err(e) = storage.write_at(task.offset + off, data) {
                    storage_error = Some(e);
                    return Ok(0);
                }
                received.set(end);
                Ok(data.len())
            })
            .map_err(ChunkError::Curl)?;
        transfer.perform()
    };

    if let Some(e) = storage_error {
        return Err(ChunkError::Storage(e));
    }
    if let Err(e) = performed {
        // Write errors are our own aborts; the status checks below explain them.
        if !e.is_write_error() {
            return Err(ChunkError::Curl(e));
        }
    }

    let code = easy.response_code().map_err(ChunkError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(ChunkError::Http(code));
    }
    if code != 206 {
        return Err(ChunkError::InvalidRangeResponse(code));
    }

    let received = received.get();
    if received != expected {
        return Err(ChunkError::PartialTransfer { expected, received });
    }
    Ok(())
}
