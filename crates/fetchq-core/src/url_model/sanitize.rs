//! Filename sanitization.

/// Characters rejected by at least one common filesystem.
const ILLEGAL: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Longest name most filesystems accept, in bytes.
const NAME_MAX: usize = 255;

/// Strips filesystem-illegal and control characters, then trims surrounding
/// whitespace. Characters are removed, not replaced.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect();

    let trimmed = stripped.trim();

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
