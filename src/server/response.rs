use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use super::headers::Headers;
use super::http_status::HttpStatus;

pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    File(File),
}

pub struct Response {
    pub status: HttpStatus,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    fn new(status: HttpStatus) -> Self {
        let mut headers = Headers::new();
        headers.append("Server", SERVER_NAME);
        headers.append("Date", httpdate::fmt_http_date(SystemTime::now()));
        headers.append("Connection", "close");
        Self {
            status,
            headers,
            body: Body::Empty,
        }
    }

    pub fn file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let mut response = Self::new(HttpStatus::Ok);
        response.headers.append("Content-Type", mime.as_ref());
        response.headers.append("Content-Length", metadata.len().to_string());
        if let Ok(modified) = metadata.modified() {
            response
                .headers
                .append("Last-Modified", httpdate::fmt_http_date(modified));
        }
        response.body = Body::File(file);
        Ok(response)
    }

    pub fn html(status: HttpStatus, html: String) -> Self {
        let mut response = Self::new(status);
        response
            .headers
            .append("Content-Type", "text/html; charset=utf-8");
        response
            .headers
            .append("Content-Length", html.len().to_string());
        response.body = Body::Bytes(html.into_bytes());
        response
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(HttpStatus::MovedPermanently);
        response.headers.append("Location", location);
        response.headers.append("Content-Length", "0");
        response
    }

    pub fn error(status: HttpStatus) -> Self {
        let body = format!(
            "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{code} {text}</title>\n</head>\n<body>\n<h1>{code} {text}</h1>\n</body>\n</html>\n",
            code = status.code(),
            text = status.text()
        );
        Self::html(status, body)
    }

    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = self.status.as_response_line();
        self.headers.serialize_into(&mut head);
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Writes the response and returns the number of body bytes sent.
    /// The head is written exactly as `headers` stands at call time.
    pub fn write_to(self, stream: impl Write, head_only: bool) -> io::Result<u64> {
        let mut writer = BufWriter::new(stream);
        writer.write_all(&self.head_bytes())?;

        let sent = if head_only {
            0
        } else {
            match self.body {
                Body::Empty => 0,
                Body::Bytes(bytes) => {
                    writer.write_all(&bytes)?;
                    bytes.len() as u64
                }
                Body::File(mut file) => io::copy(&mut file, &mut writer)?,
            }
        };

        writer.flush()?;
        Ok(sent)
    }
}
