#![allow(dead_code)]

pub mod range_server;

use std::sync::Arc;

use fetchq_core::config::{FetchqConfig, RetryConfig};
use fetchq_core::resolver::{ResolvedTarget, Resolver};
use fetchq_core::EngineError;

/// Defaults with the waits shrunk for tests.
pub fn fast_config() -> FetchqConfig {
    FetchqConfig {
        pacing_delay_secs: 0.0,
        transfer_timeout_secs: 5,
        probe_timeout_secs: 5,
        page_timeout_secs: 5,
        pause_poll_secs: 0.01,
        retry: Some(RetryConfig {
            max_attempts: 3,
            delay_secs: 0.01,
        }),
        ..FetchqConfig::default()
    }
}

/// Resolver that maps every page URL to one direct URL with a fixed name.
pub fn fixed_resolver(direct_url: String, name: &str) -> Arc<dyn Resolver> {
    let name = name.to_string();
    Arc::new(move |_: &str| -> Result<ResolvedTarget, EngineError> {
        Ok(ResolvedTarget {
            file_name: Some(name.clone()),
            direct_url: direct_url.clone(),
        })
    })
}

/// Deterministic non-repeating-ish test body.
pub fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
