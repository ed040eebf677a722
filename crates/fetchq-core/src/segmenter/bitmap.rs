//! Chunk completion bitmap.

/// One bit per chunk (LSB of byte 0 = chunk 0), sized for a fixed chunk count.
#[derive(Debug, Clone, Default)]
pub struct ChunkBitmap {
    bytes: Vec<u8>,
    count: usize,
}

impl ChunkBitmap {
    pub fn new(count: usize) -> Self {
        ChunkBitmap {
            bytes: vec![0u8; count.div_ceil(8)],
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mark chunk `index` as completed. Out-of-range indices are ignored.
    pub fn set_completed(&mut self, index: usize) {
        if index >= self.count {
            return;
        }
        self.bytes[index / 8] |= 1 << (index % 8);
    }

    pub fn is_completed(&self, index: usize) -> bool {
        index < self.count && self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    pub fn completed_count(&self) -> usize {
        (0..self.count).filter(|&i| self.is_completed(i)).count()
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count() == self.count
    }

    /// Indices of chunks not yet completed, ascending.
    pub fn missing(&self) -> Vec<usize> {
        (0..self.count).filter(|&i| !self.is_completed(i)).collect()
    }
}
