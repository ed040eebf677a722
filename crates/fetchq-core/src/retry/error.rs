//! Chunk download error type for retry classification.

use std::fmt;

/// Error returned by a single chunk attempt.
/// Kept separate from `EngineError` so the retry loop can classify it first.
#[derive(Debug)]
pub enum ChunkError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// 2xx but not `206 Partial Content` (e.g. the server ignored Range).
    InvalidRangeResponse(u32),
    /// Fewer bytes arrived than the chunk spans (server closed early).
    PartialTransfer { expected: u64, received: u64 },
    /// Disk write failed. Not retried.
    Storage(anyhow::Error),
    /// Stop was requested before the attempt started.
    Cancelled,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Curl(e) => write!(f, "{}", e),
            ChunkError::Http(code) => write!(f, "HTTP {}", code),
            ChunkError::InvalidRangeResponse(code) => {
                write!(f, "expected 206 Partial Content, got HTTP {}", code)
            }
            ChunkError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            ChunkError::Storage(e) => write!(f, "storage: {:#}", e),
            ChunkError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkError::Curl(e) => Some(e),
            ChunkError::Storage(e) => Some(e.as_ref()),
            ChunkError::Http(_)
            | ChunkError::InvalidRangeResponse(_)
            | ChunkError::PartialTransfer { .. }
            | ChunkError::Cancelled => None,
        }
    }
}
