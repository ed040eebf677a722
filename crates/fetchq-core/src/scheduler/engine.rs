//! DownloadEngine: one item end to end.
//!
//! resolve → name → probe → strategy → transfer into `<name>.part` → rename.
//! The control state is checked between every step; the transfer layers
//! check it at their own suspension points.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchqConfig;
use crate::control::EngineControl;
use crate::downloader::{self, TransferOptions};
use crate::error::EngineError;
use crate::events::{EngineEvent, Observer};
use crate::fetch_head;
use crate::resolver::{validate_direct_url, Resolver};
use crate::storage::{self, StorageWriterBuilder};
use crate::url_model::item_file_name;

use super::choose::{choose_strategy, TransferStrategy};
use super::progress::ProgressReporter;

/// Per-item transfer description, derived at the start of processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub file_name: String,
    pub direct_url: String,
    /// 0 when the origin did not send `Content-Length`.
    pub total_size: u64,
    pub supports_ranges: bool,
}

/// What a successful item produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub target: TransferTarget,
    pub path: PathBuf,
    pub bytes: u64,
    pub strategy: TransferStrategy,
}

pub struct DownloadEngine {
    resolver: Arc<dyn Resolver>,
    control: Arc<EngineControl>,
    transfer: TransferOptions,
    probe_timeout: Duration,
    speed_interval: Duration,
}

impl DownloadEngine {
    pub fn new(cfg: &FetchqConfig, resolver: Arc<dyn Resolver>, control: Arc<EngineControl>) -> Self {
        Self {
            resolver,
            control,
            transfer: TransferOptions::from_config(cfg),
            probe_timeout: cfg.probe_timeout(),
            speed_interval: cfg.speed_interval(),
        }
    }

    pub fn control(&self) -> &Arc<EngineControl> {
        &self.control
    }

    /// Resolves and downloads `source_url` into `download_dir`.
    pub fn process_item(
        &self,
        source_url: &str,
        download_dir: &Path,
        observer: &dyn Observer,
    ) -> Result<ItemOutcome, EngineError> {
        self.control.checkpoint()?;
        let target = self.resolve_target(source_url)?;

        self.control.checkpoint()?;
        let target = self.probe_target(target)?;

        observer.notify(EngineEvent::FileInfo {
            file_name: target.file_name.clone(),
            total_size: target.total_size,
        });
        observer.notify(EngineEvent::Log(format!(
            "Starting: {} ({})",
            target.file_name,
            format_megabytes(target.total_size)
        )));

        self.control.checkpoint()?;
        let strategy = choose_strategy(
            target.total_size,
            target.supports_ranges,
            self.transfer.chunk_size,
        );
        let path = download_dir.join(&target.file_name);
        tracing::info!(
            file = %target.file_name,
            size = target.total_size,
            ?strategy,
            "starting transfer"
        );

        let bytes = self.transfer_target(&target, strategy, &path, observer)?;
        Ok(ItemOutcome {
            target,
            path,
            bytes,
            strategy,
        })
    }

    fn resolve_target(&self, source_url: &str) -> Result<TransferTarget, EngineError> {
        let resolved = self.resolver.resolve(source_url)?;
        let direct = validate_direct_url(&resolved)?;
        Ok(TransferTarget {
            file_name: item_file_name(resolved.file_name.as_deref(), source_url),
            direct_url: direct.to_string(),
            total_size: 0,
            supports_ranges: false,
        })
    }

    fn probe_target(&self, target: TransferTarget) -> Result<TransferTarget, EngineError> {
        let head = fetch_head::probe(&target.direct_url, &self.transfer.headers, self.probe_timeout)
            .map_err(|e| EngineError::probe(format!("{:#}", e)))?;
        tracing::debug!(
            url = %target.direct_url,
            content_length = ?head.content_length,
            accept_ranges = head.accept_ranges,
            "probe"
        );
        Ok(TransferTarget {
            total_size: head.content_length.unwrap_or(0),
            supports_ranges: head.accept_ranges,
            ..target
        })
    }

    fn transfer_target(
        &self,
        target: &TransferTarget,
        strategy: TransferStrategy,
        path: &Path,
        observer: &dyn Observer,
    ) -> Result<u64, EngineError> {
        let temp = storage::temp_path(path);
        let mut builder =
            StorageWriterBuilder::create(&temp).map_err(|e| EngineError::storage(&e))?;
        if strategy == TransferStrategy::Ranged {
            builder
                .preallocate(target.total_size)
                .map_err(|e| EngineError::storage(&e))?;
        }
        let writer = builder.build();

        let mut progress = ProgressReporter::new(observer, target.total_size, self.speed_interval);
        let bytes = match strategy {
            TransferStrategy::Ranged => {
                downloader::download_ranged(
                    &target.direct_url,
                    &self.transfer,
                    &writer,
                    target.total_size,
                    &self.control,
                    &mut progress,
                )?;
                target.total_size
            }
            TransferStrategy::SingleStream => {
                let expected = (target.total_size > 0).then_some(target.total_size);
                downloader::download_single(
                    &target.direct_url,
                    &self.transfer,
                    &writer,
                    expected,
                    &self.control,
                    &mut progress,
                )?
            }
        };

        writer.sync().map_err(|e| EngineError::storage(&e))?;
        writer
            .finalize(path)
            .map_err(|e| EngineError::storage(&e))?;
        Ok(bytes)
    }
}

fn format_megabytes(bytes: u64) -> String {
    if bytes == 0 {
        return "unknown size".to_string();
    }
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
