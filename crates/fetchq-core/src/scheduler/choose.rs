//! Transfer strategy selection.

/// How one item is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// Parallel byte-range chunks.
    Ranged,
    /// One sequential GET.
    SingleStream,
}

/// Chunked only when the file is larger than one chunk and the origin
/// advertises byte ranges. Unknown size (0) always streams.
pub fn choose_strategy(total_size: u64, supports_ranges: bool, chunk_size: u64) -> TransferStrategy {
    if supports_ranges && total_size > chunk_size {
        TransferStrategy::Ranged
    } else {
        TransferStrategy::SingleStream
    }
}
