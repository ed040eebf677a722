use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Chunk retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Fixed delay in seconds between attempts. Does not grow.
    pub delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 1.0,
        }
    }
}

/// Global configuration loaded from `~/.config/fetchq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchqConfig {
    /// Byte span of one chunk task. Files larger than this (with range support) are chunked.
    pub chunk_size: u64,
    /// Maximum concurrent chunk workers per file.
    pub max_workers: usize,
    /// Buffer size for single-stream transfers.
    pub stream_buffer_bytes: usize,
    /// Pause between queue items, in seconds.
    pub pacing_delay_secs: f64,
    /// Timeout for the size/range probe.
    pub probe_timeout_secs: u64,
    /// Timeout for fetching a resolver page.
    pub page_timeout_secs: u64,
    /// Connect timeout and stall window for chunk and stream requests.
    pub transfer_timeout_secs: u64,
    /// Minimum interval between transfer-rate emissions.
    pub speed_interval_secs: f64,
    /// How often a paused worker re-checks the control state.
    pub pause_poll_secs: f64,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Destination directory; `None` = `~/Downloads` (or the current dir if that is unknown).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Extra request headers sent with every page, probe and transfer request.
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchqConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::segmenter::DEFAULT_CHUNK_SIZE,
            max_workers: 8,
            stream_buffer_bytes: 8 * 1024,
            pacing_delay_secs: 2.0,
            probe_timeout_secs: 10,
            page_timeout_secs: 30,
            transfer_timeout_secs: 20,
            speed_interval_secs: 0.5,
            pause_poll_secs: 0.1,
            retry: None,
            download_dir: None,
            headers: default_headers(),
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    let mut h = BTreeMap::new();
    h.insert(
        "Accept".to_string(),
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
    );
    h.insert("Accept-Language".to_string(), "en-US,en;q=0.5".to_string());
    h.insert(
        "User-Agent".to_string(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
            .to_string(),
    );
    h
}

fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v.max(0.0)).unwrap_or(Duration::ZERO)
}

impl FetchqConfig {
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn pacing_delay(&self) -> Duration {
        secs(self.pacing_delay_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn speed_interval(&self) -> Duration {
        secs(self.speed_interval_secs)
    }

    pub fn pause_poll(&self) -> Duration {
        secs(self.pause_poll_secs)
    }

    /// Configured download dir, else `~/Downloads`, else the current directory.
    pub fn effective_download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Downloads"))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchqConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FetchqConfig::default();
        assert_eq!(cfg.chunk_size, 4 * 1024 * 1024);
        assert_eq!(cfg.max_workers, 8);
        assert_eq!(cfg.stream_buffer_bytes, 8192);
        assert_eq!(cfg.pacing_delay(), Duration::from_secs(2));
        assert_eq!(cfg.probe_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.speed_interval(), Duration::from_millis(500));
        assert_eq!(cfg.pause_poll(), Duration::from_millis(100));
        let retry = cfg.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.delay_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FetchqConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FetchqConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
        assert_eq!(parsed.max_workers, cfg.max_workers);
        assert_eq!(parsed.headers, cfg.headers);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            chunk_size = 1048576
            max_workers = 4
            stream_buffer_bytes = 16384
            pacing_delay_secs = 0.0
            probe_timeout_secs = 5
            page_timeout_secs = 15
            transfer_timeout_secs = 60
            speed_interval_secs = 1.0
            pause_poll_secs = 0.25
            download_dir = "/srv/downloads"

            [retry]
            max_attempts = 5
            delay_secs = 0.5

            [headers]
            Referer = "https://example.com/"
        "#;
        let cfg: FetchqConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.chunk_size, 1_048_576);
        assert_eq!(cfg.max_workers, 4);
        assert_eq!(cfg.pacing_delay(), Duration::ZERO);
        assert_eq!(cfg.pause_poll(), Duration::from_millis(250));
        assert_eq!(cfg.retry_config().max_attempts, 5);
        assert_eq!(
            cfg.effective_download_dir(),
            PathBuf::from("/srv/downloads")
        );
        assert_eq!(
            cfg.headers.get("Referer").map(String::as_str),
            Some("https://example.com/")
        );
    }

    #[test]
    fn missing_headers_table_keeps_browser_defaults() {
        let toml = r#"
            chunk_size = 1048576
            max_workers = 4
            stream_buffer_bytes = 16384
            pacing_delay_secs = 0.0
            probe_timeout_secs = 5
            page_timeout_secs = 15
            transfer_timeout_secs = 60
            speed_interval_secs = 1.0
            pause_poll_secs = 0.25
        "#;
        let cfg: FetchqConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.headers, default_headers());
        assert!(cfg.headers["User-Agent"].starts_with("Mozilla/5.0"));
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        let cfg = FetchqConfig {
            pacing_delay_secs: -3.0,
            ..FetchqConfig::default()
        };
        assert_eq!(cfg.pacing_delay(), Duration::ZERO);
    }
}
