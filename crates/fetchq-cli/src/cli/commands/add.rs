//! `fetchq add` – append page links to the saved queue.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::load_queue;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s#]+").expect("link regex is valid"));

/// Every http/https URL in `text`, in order of appearance.
pub(crate) fn extract_links(text: &str) -> Vec<String> {
    LINK_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn run_add(urls: &[String], file: Option<&Path>) -> Result<()> {
    let mut links: Vec<String> = urls.iter().flat_map(|u| extract_links(u)).collect();
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read links from {}", path.display()))?;
        links.extend(extract_links(&text));
    }
    if links.is_empty() {
        anyhow::bail!("no http/https links given");
    }

    let (store, mut queue, warning) = load_queue()?;
    if let Some(w) = warning {
        eprintln!("warning: {}", w);
    }
    let mut added = 0usize;
    for link in &links {
        if queue.push_link(link) {
            added += 1;
        }
    }
    store.save(&queue.to_records())?;

    let skipped = links.len() - added;
    if skipped > 0 {
        println!("Added {} link(s), skipped {} already queued.", added, skipped);
    } else {
        println!("Added {} link(s).", added);
    }
    tracing::info!(added, skipped, "links added");
    Ok(())
}
