//! Chunk task type and fixed-span planning.

/// Default chunk span: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// One chunk: byte range [offset, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTask {
    /// Start offset (inclusive).
    pub offset: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ChunkTask {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value for curl's range option / the `Range` header (inclusive end): `start-(end-1)`.
    pub fn range_spec(&self) -> String {
        format!("{}-{}", self.offset, self.end.saturating_sub(1))
    }

    /// Full HTTP Range header value: `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.range_spec())
    }
}

/// Partitions `[0, total_size)` into consecutive spans of `chunk_size` bytes.
///
/// Every task is exactly `chunk_size` long except the last, which holds the
/// remainder. Returns an empty vec if `total_size` or `chunk_size` is 0.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<ChunkTask> {
    if total_size == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let count = total_size.div_ceil(chunk_size);
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    while offset < total_size {
        let end = offset.saturating_add(chunk_size).min(total_size);
        out.push(ChunkTask { offset, end });
        offset = end;
    }
    out
}
