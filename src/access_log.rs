//! Per-request access log, colored by status class.

use ansi_term::Colour;
use chrono::{DateTime, Local};
use std::io::Write;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};

/// One completed request, formatted and printed immediately.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub client: IpAddr,
    pub time: DateTime<Local>,
    pub request_line: String,
    pub status: u16,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    /// Classifies by the first digit of the three-digit code.
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            300..=399 => Self::Redirect,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }

    pub fn colour(self) -> Option<Colour> {
        match self {
            Self::Success => Some(Colour::Green),
            Self::Redirect => Some(Colour::Blue),
            Self::ClientError => Some(Colour::Yellow),
            Self::ServerError => Some(Colour::Red),
            Self::Other => None,
        }
    }
}

impl LogEntry {
    pub fn message(&self) -> String {
        let size = self
            .size
            .map_or_else(|| "-".to_string(), |size| size.to_string());
        format!("\"{}\" {} {}", self.request_line, self.status, size)
    }

    pub fn format_line(&self) -> String {
        let message = self.message();
        let painted = match StatusClass::of(self.status).colour() {
            Some(colour) => colour.paint(message).to_string(),
            None => message,
        };

        format!(
            "{} - - [{}] {}",
            self.client,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            painted
        )
    }
}

/// Called once for every completed request.
pub trait RequestLogger: Send + Sync {
    fn log_request(&self, entry: &LogEntry);
}

/// Writes colored access lines, one whole line per lock.
pub struct ColorLogger {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ColorLogger {
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for ColorLogger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl RequestLogger for ColorLogger {
    fn log_request(&self, entry: &LogEntry) {
        let line = entry.format_line();
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            log::warn!("Failed to write access log line: {}", e);
        }
    }
}
