//! Regex scraping of download pages.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("script regex is valid")
});

static WINDOW_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"window\.open\(\s*["'](https?://[^\s"')]+)"#).expect("window.open regex is valid")
});

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta regex is valid"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute regex is valid")
});

/// First `window.open("http...")` target inside a script that defines `function download`.
pub fn extract_direct_url(html: &str) -> Option<String> {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|text| text.contains("function download"))
        .find_map(|text| {
            WINDOW_OPEN_RE
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| unescape(m.as_str()))
        })
}

/// `content` of `<meta name="title" ...>`, if present and non-blank.
pub fn extract_title(html: &str) -> Option<String> {
    META_RE.find_iter(html).find_map(|tag| {
        let mut name = None;
        let mut content = None;
        for c in ATTR_RE.captures_iter(tag.as_str()) {
            let key = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = c.get(2).or_else(|| c.get(3)).map(|m| m.as_str());
            if key.eq_ignore_ascii_case("name") {
                name = value;
            } else if key.eq_ignore_ascii_case("content") {
                content = value;
            }
        }
        match (name, content) {
            (Some(n), Some(v)) if n.eq_ignore_ascii_case("title") && !v.trim().is_empty() => {
                Some(unescape(v.trim()))
            }
            _ => None,
        }
    })
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
