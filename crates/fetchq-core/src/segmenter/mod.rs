//! Range math and chunk planning.
//!
//! Splits a file into fixed-size chunk tasks, computes HTTP Range header
//! bounds, and tracks which chunks have landed on disk.

mod bitmap;
mod range;

pub use bitmap::ChunkBitmap;
pub use range::{plan_chunks, ChunkTask, DEFAULT_CHUNK_SIZE};
