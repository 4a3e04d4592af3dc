use log::debug;
use std::io::Read;

use super::http_status::HttpStatus;

pub const MAX_HEAD_SIZE: usize = 64 * 1024;
pub const MAX_HEADERS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    /// Request line as received, for the access log.
    pub request_line: String,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Why a request head could not be turned into a `Request`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub status: HttpStatus,
    /// Whatever request line was recovered, possibly empty.
    pub request_line: String,
}

impl ParseError {
    fn new(status: HttpStatus, request_line: &str) -> Self {
        Self {
            status,
            request_line: request_line.to_string(),
        }
    }
}

/// Reads bytes until the blank line ending the request head.
/// `Ok(None)` means the peer closed before sending anything.
pub fn read_head(stream: &mut impl Read) -> Result<Option<Vec<u8>>, ParseError> {
    let mut buffer = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Error reading request head: {}", e);
                0
            }
        };

        if n == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(&chunk[..n]);

        if let Some(end) = head_end(&buffer) {
            buffer.truncate(end);
            return Ok(Some(buffer));
        }

        if buffer.len() > MAX_HEAD_SIZE {
            let status = if buffer.contains(&b'\n') {
                HttpStatus::RequestHeaderFieldsTooLarge
            } else {
                HttpStatus::UriTooLong
            };
            return Err(ParseError::new(status, ""));
        }
    }
}

fn head_end(buffer: &[u8]) -> Option<usize> {
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| i + 4);
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);

    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

pub fn parse(head: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.lines();

    let request_line = lines.next().unwrap_or("").trim_end_matches('\r').to_string();
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() != 3 {
        debug!("Malformed request line: {:?}", request_line);
        return Err(ParseError::new(HttpStatus::BadRequest, &request_line));
    }

    let (method, target, version) = (parts[0], parts[1], parts[2]);
    let (major, _minor) =
        parse_version(version).ok_or_else(|| ParseError::new(HttpStatus::BadRequest, &request_line))?;
    if major >= 2 {
        return Err(ParseError::new(HttpStatus::HttpVersionNotSupported, &request_line));
    }

    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(ParseError::new(
                HttpStatus::RequestHeaderFieldsTooLarge,
                &request_line,
            ));
        }
        match line.split_once(':') {
            Some((name, value)) => headers.push((name.trim().to_string(), value.trim().to_string())),
            None => return Err(ParseError::new(HttpStatus::BadRequest, &request_line)),
        }
    }

    debug!("Parsed request: {} {}", method, target);

    Ok(Request {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
        request_line,
    })
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let number = version.strip_prefix("HTTP/")?;
    let (major, minor) = number.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
