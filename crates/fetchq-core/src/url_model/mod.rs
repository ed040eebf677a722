//! Local file naming for queue items.
//!
//! The resolver's display name is preferred; it is stripped of characters
//! that are illegal in file names. Without a usable name the last path
//! segment of the source URL is used.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;

/// Default filename when neither the resolver nor the URL path yields anything usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives the local filename for an item.
///
/// # Examples
///
/// - `item_file_name(Some("Report: Q1?.pdf"), "https://host/p/123")` → `"Report Q1.pdf"`
/// - `item_file_name(None, "https://host/files/a.zip?x=1")` → `"a.zip"`
pub fn item_file_name(resolved_name: Option<&str>, source_url: &str) -> String {
    resolved_name
        .map(sanitize_filename)
        .filter(|s| is_usable(s))
        .or_else(|| {
            filename_from_url_path(source_url)
                .map(|s| sanitize_filename(&s))
                .filter(|s| is_usable(s))
        })
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

fn is_usable(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
}
