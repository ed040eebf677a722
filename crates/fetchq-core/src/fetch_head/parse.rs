//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut result = HeadResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    result.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                result.accept_ranges = value
                    .split(',')
                    .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length_and_ranges() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(r.content_length, Some(12345));
        assert!(r.accept_ranges);
    }

    #[test]
    fn parse_headers_no_ranges() {
        let r = parse_headers(&lines(&["Content-Length: 999", "Accept-Ranges: none"]));
        assert_eq!(r.content_length, Some(999));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn parse_headers_case_insensitive() {
        let r = parse_headers(&lines(&["content-length: 7", "ACCEPT-RANGES: Bytes"]));
        assert_eq!(r.content_length, Some(7));
        assert!(r.accept_ranges);
    }

    #[test]
    fn parse_headers_missing_length() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Content-Type: text/plain"]));
        assert_eq!(r, HeadResult::default());
    }

    #[test]
    fn parse_headers_bad_length_ignored() {
        let r = parse_headers(&lines(&["Content-Length: lots"]));
        assert_eq!(r.content_length, None);
    }
}
