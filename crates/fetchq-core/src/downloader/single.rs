//! Single-stream GET (no Range), written sequentially from offset 0.

use std::cell::Cell;

use super::{configure, parse_status_line, TransferOptions};
use crate::control::EngineControl;
use crate::error::EngineError;
use crate::scheduler::ProgressReporter;
use crate::storage::StorageWriter;

/// Streams `url` into `storage` in `opts.stream_buffer_bytes` pieces.
///
/// The control state is checked before each buffer is written: pause blocks
/// the transfer there, stop aborts it with `Cancelled`. There is no retry;
/// any transport error fails the item. When `expected_len` is known a
/// shorter body is a failure too. Returns the number of bytes written.
pub fn download_single(
    url: &str,
    opts: &TransferOptions,
    storage: &StorageWriter,
    expected_len: Option<u64>,
    control: &EngineControl,
    progress: &mut ProgressReporter<'_>,
) -> Result<u64, EngineError> {
    let status = Cell::new(0u32);
    let mut written = 0u64;
    let mut cancelled = false;
    let mut storage_error: Option<anyhow::Error> = None;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts).map_err(EngineError::transfer)?;
    easy.buffer_size(opts.stream_buffer_bytes)
        .map_err(EngineError::transfer)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                if let Some(code) = parse_status_line(line) {
                    status.set(code);
                }
                true
            })
            .map_err(EngineError::transfer)?;
        transfer
            .write_function(|data| {
                if !(200..300).contains(&status.get()) {
                    return Ok(0);
                }
                if control.checkpoint().is_err() {
                    cancelled = true;
                    return Ok(0);
                }
                if let Err(e) = storage.write_at(written, data) {
                    storage_error = Some(e);
                    return Ok(0);
                }
                written += data.len() as u64;
                progress.add(data.len() as u64);
                Ok(data.len())
            })
            .map_err(EngineError::transfer)?;
        transfer.perform()
    };

    if cancelled {
        return Err(EngineError::Cancelled);
    }
    if let Some(e) = storage_error {
        return Err(EngineError::storage(&e));
    }
    if let Err(e) = performed {
        if !e.is_write_error() {
            return Err(EngineError::transfer(e));
        }
    }

    let code = easy.response_code().map_err(EngineError::transfer)?;
    if !(200..300).contains(&code) {
        return Err(EngineError::transfer(format!("HTTP {}", code)));
    }
    if let Some(exp) = expected_len {
        if written != exp {
            return Err(EngineError::transfer(format!(
                "partial transfer: wrote {} of {} bytes",
                written, exp
            )));
        }
    }
    Ok(written)
}
