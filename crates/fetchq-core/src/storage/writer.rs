//! Concurrent offset writer for temp download files.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

/// Writer for a temp download file. Cheap to clone and usable from many workers.
///
/// On Unix each `write_at` is a positional `pwrite` with no shared cursor.
/// Elsewhere the seek-then-write pair goes through a mutex so one worker's
/// bytes never land at another worker's offset.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    temp_path: std::path::PathBuf,
    #[cfg(not(unix))]
    seek_lock: Arc<std::sync::Mutex<()>>,
}

impl StorageWriter {
    pub(crate) fn from_file_and_path(file: File, temp_path: std::path::PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            temp_path,
            #[cfg(not(unix))]
            seek_lock: Arc::new(std::sync::Mutex::new(())),
        }
    }

    /// Write all of `data` at `offset`.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.file
            .write_all_at(data, offset)
            .with_context(|| format!("write {} bytes at offset {}", data.len(), offset))
    }

    #[cfg(not(unix))]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        let _guard = self
            .seek_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut f: &File = &self.file;
        f.seek(SeekFrom::Start(offset))
            .with_context(|| format!("seek to offset {}", offset))?;
        f.write_all(data)
            .with_context(|| format!("write {} bytes at offset {}", data.len(), offset))
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("storage sync failed")?;
        Ok(())
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file to `final_path`, replacing any existing file there.
    /// Consumes this handle; other clones must be dropped first on platforms that
    /// refuse to rename open files.
    pub fn finalize(self, final_path: &Path) -> Result<()> {
        let temp_path = self.temp_path.clone();
        drop(self.file);

        std::fs::rename(&temp_path, final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
        Ok(())
    }
}
