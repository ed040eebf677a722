use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{merge_records, SessionRecord};

const SESSION_FILE: &str = "session.json";
const CORRUPT_SUFFIX: &str = ".bad";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file exists but is not a valid session.
    #[error("session file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/state/fetchq/session.json`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(crate::logging::state_dir()?.join(SESSION_FILE))
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `records`, in order.
    ///
    /// Writes a sibling temp file first and renames it over the old one, so a
    /// crash mid-write leaves the previous session intact.
    pub fn save(&self, records: &[SessionRecord]) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(records).map_err(|e| SessionError::Io {
            path: self.path.clone(),
            source: e.into(),
        })?;
        let tmp = crate::storage::temp_path(&self.path);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "session saved");
        Ok(())
    }

    /// Read the records back. A missing file is an empty session.
    pub fn load(&self) -> Result<Vec<SessionRecord>, SessionError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Where a corrupt session is moved aside: `session.json.bad`.
    pub fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(CORRUPT_SUFFIX);
        self.path.with_file_name(name)
    }

    /// `load` that always yields a queue. On error the session starts empty
    /// and a warning for the operator is returned alongside; a corrupt file
    /// is first moved to `corrupt_backup_path` so the next save cannot
    /// destroy it.
    pub fn load_or_recover(&self) -> (Vec<SessionRecord>, Option<String>) {
        let err = match self.load() {
            Ok(records) => return (records, None),
            Err(e) => e,
        };
        let warning = match &err {
            SessionError::Corrupt { .. } => {
                let backup = self.corrupt_backup_path();
                match std::fs::rename(&self.path, &backup) {
                    Ok(()) => format!(
                        "{}; kept as {}, starting with an empty queue",
                        err,
                        backup.display()
                    ),
                    Err(e) => format!(
                        "{}; could not move it aside ({}), starting with an empty queue",
                        err, e
                    ),
                }
            }
            SessionError::Io { .. } => format!("{}; starting with an empty queue", err),
        };
        tracing::warn!("{}", warning);
        (Vec::new(), Some(warning))
    }

    /// Save the records of a finished run, keeping links another process
    /// added to the file since the run loaded it.
    pub fn save_merged(&self, run: &[SessionRecord]) -> Result<(), SessionError> {
        let (on_disk, _) = self.load_or_recover();
        self.save(&merge_records(run, &on_disk))
    }

    /// Explicit clear: persist an empty session.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.save(&[])
    }
}
