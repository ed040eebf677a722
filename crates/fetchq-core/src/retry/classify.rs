//! Map chunk failures onto the retry policy's error kinds.

use super::error::ChunkError;
use super::policy::ErrorKind;

pub fn classify(e: &ChunkError) -> ErrorKind {
    match e {
        ChunkError::Storage(_) => ErrorKind::Storage,
        ChunkError::Curl(_)
        | ChunkError::Http(_)
        | ChunkError::InvalidRangeResponse(_)
        | ChunkError::PartialTransfer { .. }
        | ChunkError::Cancelled => ErrorKind::Transient,
    }
}
