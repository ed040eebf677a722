//! HTTP transfers for one resolved target.
//!
//! Two strategies: `download_ranged` splits the file into fixed spans fetched
//! by a bounded pool of curl workers with per-chunk retry, and
//! `download_single` streams the body sequentially. Both write through a
//! `StorageWriter` and report progress through a `ProgressReporter`.

mod chunk;
mod run;
mod single;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::FetchqConfig;
use crate::retry::RetryPolicy;

pub use run::download_ranged;
pub use single::download_single;

/// Curl and pool settings shared by both strategies.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Connect timeout, and how long a transfer may stall before it fails.
    pub transfer_timeout: Duration,
    pub stream_buffer_bytes: usize,
    pub chunk_size: u64,
    pub max_workers: usize,
    pub retry: RetryPolicy,
}

impl TransferOptions {
    pub fn from_config(cfg: &FetchqConfig) -> Self {
        Self {
            headers: cfg.headers.clone(),
            transfer_timeout: cfg.transfer_timeout(),
            stream_buffer_bytes: cfg.stream_buffer_bytes.max(1),
            chunk_size: cfg.chunk_size.max(1),
            max_workers: cfg.max_workers.max(1),
            retry: RetryPolicy::from(&cfg.retry_config()),
        }
    }
}

/// Options common to chunk and stream requests.
fn configure(easy: &mut curl::easy::Easy, url: &str, opts: &TransferOptions) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.transfer_timeout)?;
    // Stall detection instead of a wall-clock limit: fail when nothing arrives for the window.
    easy.low_speed_limit(1)?;
    easy.low_speed_time(opts.transfer_timeout)?;

    let mut list = curl::easy::List::new();
    for (k, v) in &opts.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)?;
    Ok(())
}

/// Status code from a raw header line, if the line is a status line.
fn parse_status_line(data: &[u8]) -> Option<u32> {
    let line = std::str::from_utf8(data).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
