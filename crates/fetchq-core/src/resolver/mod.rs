//! Resolver interface: page URL in, direct file URL (and maybe a name) out.
//!
//! The engine only depends on the `Resolver` trait. `PageResolver` is the
//! bundled implementation that scrapes a download page over HTTP; any
//! closure with the right signature works too.

mod page;

pub use page::{extract_direct_url, extract_title, PageResolver};

use crate::error::EngineError;

/// What a resolver hands back for one page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Display name for the file, unsanitized. `None` when the page has none.
    pub file_name: Option<String>,
    pub direct_url: String,
}

pub trait Resolver: Send + Sync {
    fn resolve(&self, page_url: &str) -> Result<ResolvedTarget, EngineError>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Result<ResolvedTarget, EngineError> + Send + Sync,
{
    fn resolve(&self, page_url: &str) -> Result<ResolvedTarget, EngineError> {
        self(page_url)
    }
}

/// Rejects direct URLs the transfer layer cannot use.
pub(crate) fn validate_direct_url(target: &ResolvedTarget) -> Result<url::Url, EngineError> {
    let parsed = url::Url::parse(target.direct_url.trim()).map_err(|e| {
        EngineError::resolution(format!("malformed direct URL {:?}: {}", target.direct_url, e))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(EngineError::resolution(format!(
            "unsupported scheme {:?} in direct URL",
            other
        ))),
    }
}
