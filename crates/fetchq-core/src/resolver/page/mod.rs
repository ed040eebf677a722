//! Download-page resolver over HTTP.

mod parse;

pub use parse::{extract_direct_url, extract_title};

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;

use super::{ResolvedTarget, Resolver};
use crate::config::FetchqConfig;
use crate::error::EngineError;

/// Fetches the page with a plain GET and scrapes it.
///
/// The direct URL comes from the `window.open(...)` call inside the page's
/// `function download` script; the display name from `<meta name="title">`.
#[derive(Debug, Clone)]
pub struct PageResolver {
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl PageResolver {
    pub fn new(headers: BTreeMap<String, String>, timeout: Duration) -> Self {
        Self { headers, timeout }
    }

    pub fn from_config(cfg: &FetchqConfig) -> Self {
        Self::new(cfg.headers.clone(), cfg.page_timeout())
    }

    fn fetch_page(&self, page_url: &str) -> Result<String, EngineError> {
        let mut body: Vec<u8> = Vec::new();
        let code = get(page_url, &self.headers, self.timeout, &mut body)
            .map_err(|e| EngineError::resolution(format!("{:#}", e)))?;
        if !(200..300).contains(&code) {
            return Err(EngineError::resolution(format!("HTTP {}", code)));
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn get(
    url: &str,
    headers: &BTreeMap<String, String>,
    timeout: Duration,
    body: &mut Vec<u8>,
) -> anyhow::Result<u32> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout)?;
    easy.accept_encoding("")?;

    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("page request failed")?;
    }
    Ok(easy.response_code()?)
}

impl Resolver for PageResolver {
    fn resolve(&self, page_url: &str) -> Result<ResolvedTarget, EngineError> {
        let html = self.fetch_page(page_url)?;
        let direct_url = extract_direct_url(&html)
            .ok_or_else(|| EngineError::resolution("download URL not found in page"))?;
        let file_name = extract_title(&html);
        tracing::debug!(page_url, direct_url = %direct_url, ?file_name, "resolved page");
        Ok(ResolvedTarget {
            file_name,
            direct_url,
        })
    }
}
