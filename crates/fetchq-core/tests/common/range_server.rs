//! Minimal HTTP/1.1 server for integration tests.
//!
//! Routes:
//! - `HEAD /files/<name>`: `Content-Length` and, optionally, `Accept-Ranges: bytes`.
//! - `GET /files/<name>`: `206` for a `Range` request when ranges are supported,
//!   otherwise `200` with the full body. Bodies can be cut short on demand.
//! - `GET /page/<name>`: a download page whose script opens `/files/<name>`
//!   and whose `<meta name="title">` is `<name>`.
//! - `GET /page/missing`: `404`.
//!
//! Every request is recorded so tests can assert what the client issued.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, HEAD omits `Accept-Ranges: bytes` (GET behaviour is unchanged).
    pub advertise_ranges: bool,
    /// Range requests starting at any of these offsets always get `500`.
    pub fail_offsets: Vec<u64>,
    /// Delay before answering a file GET.
    pub file_delay: Duration,
    /// Answer Range GETs with `200` and the full body, even though HEAD
    /// advertises range support.
    pub ignore_range_requests: bool,
    /// Bytes cut from the end of every file GET body. `Content-Length`
    /// matches what is sent, so the client sees a clean but short response.
    pub truncate_body: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            advertise_ranges: true,
            fail_offsets: Vec::new(),
            file_delay: Duration::ZERO,
            ignore_range_requests: false,
            truncate_body: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// `(start, end_inclusive)` from `Range: bytes=start-end`.
    pub range: Option<(u64, u64)>,
}

pub struct TestServer {
    pub base: String,
    log: Arc<Mutex<Vec<Request>>>,
}

impl TestServer {
    /// Direct URL of the served body.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}files/{}", self.base, name)
    }

    /// Download page that resolves to `file_url(name)`.
    pub fn page_url(&self, name: &str) -> String {
        format!("{}page/{}", self.base, name)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    /// Ranges of every GET with a `Range` header, sorted by start offset.
    pub fn range_requests(&self) -> Vec<(u64, u64)> {
        let mut ranges: Vec<_> = self
            .requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .filter_map(|r| r.range)
            .collect();
        ranges.sort_unstable();
        ranges
    }

    /// File GETs without a `Range` header.
    pub fn full_gets(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == "GET" && r.path.starts_with("/files/") && r.range.is_none())
            .count()
    }

    /// Requests for file bytes (ranged or not), HEAD excluded.
    pub fn file_gets(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == "GET" && r.path.starts_with("/files/"))
            .count()
    }
}

pub fn start(body: Vec<u8>) -> TestServer {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}/", port);
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let log = Arc::clone(&log);
        let base = base.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let body = Arc::clone(&body);
                let opts = Arc::clone(&opts);
                let log = Arc::clone(&log);
                let base = base.clone();
                thread::spawn(move || handle(stream, &body, &opts, &log, &base));
            }
        });
    }
    TestServer { base, log }
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if data.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(data).ok()
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[String], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: &ServerOptions,
    log: &Mutex<Vec<Request>>,
    base: &str,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(raw) = read_head(&mut stream) else {
        return;
    };
    let req = parse_request(&raw);
    log.lock().unwrap().push(req.clone());

    let total = body.len() as u64;

    if let Some(name) = req.path.strip_prefix("/page/") {
        if name == "missing" || req.method != "GET" {
            respond(&mut stream, "404 Not Found", &[], b"not found");
            return;
        }
        let html = format!(
            "<html><head>\n<meta name=\"title\" content=\"{name}\">\n<script>\nfunction download() {{\n  window.open(\"{base}files/{name}\", \"_blank\");\n}}\n</script>\n</head><body>download</body></html>"
        );
        respond(
            &mut stream,
            "200 OK",
            &["Content-Type: text/html".to_string()],
            html.as_bytes(),
        );
        return;
    }

    if !req.path.starts_with("/files/") {
        respond(&mut stream, "404 Not Found", &[], b"");
        return;
    }

    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        vec!["Accept-Ranges: bytes".to_string()]
    } else {
        Vec::new()
    };

    if req.method == "HEAD" {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
            total,
            accept_ranges
                .iter()
                .map(|h| format!("{}\r\n", h))
                .collect::<String>()
        );
        let _ = stream.write_all(head.as_bytes());
        return;
    }

    if req.method != "GET" {
        respond(&mut stream, "405 Method Not Allowed", &[], b"");
        return;
    }

    if !opts.file_delay.is_zero() {
        thread::sleep(opts.file_delay);
    }

    let cut = |b: &[u8]| b.len().saturating_sub(opts.truncate_body);
    let honour_range = opts.support_ranges && !opts.ignore_range_requests;
    match req.range.filter(|_| honour_range) {
        Some((start, _)) if opts.fail_offsets.contains(&start) => {
            respond(&mut stream, "500 Internal Server Error", &[], b"boom");
        }
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl || start >= total {
                respond(
                    &mut stream,
                    "416 Range Not Satisfiable",
                    &[format!("Content-Range: bytes */{}", total)],
                    b"",
                );
                return;
            }
            let slice = &body[start as usize..=end_incl as usize];
            let slice = &slice[..cut(slice)];
            let mut headers = accept_ranges.clone();
            headers.push(format!(
                "Content-Range: bytes {}-{}/{}",
                start,
                start + (slice.len() as u64).saturating_sub(1),
                total
            ));
            respond(&mut stream, "206 Partial Content", &headers, slice);
        }
        None => respond(&mut stream, "200 OK", &accept_ranges, &body[..cut(body)]),
    }
}

fn parse_request(raw: &str) -> Request {
    let mut lines = raw.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                if let Some(spec) = value.trim().strip_prefix("bytes=") {
                    if let Some((a, b)) = spec.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end));
                    }
                }
            }
        }
    }
    Request {
        method,
        path,
        range,
    }
}
