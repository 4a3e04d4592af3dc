use chrono::Local;
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr, TcpStream};
use std::path::Path;

use super::Hooks;
use super::http_status::HttpStatus;
use super::listing;
use super::request::{self, Request};
use super::resolve::{self, Resolved, ResolveError};
use super::response::Response;
use crate::access_log::LogEntry;

/// Serves a single request on `stream`, then closes it.
pub fn handle_client(mut stream: TcpStream, root: &Path, hooks: &Hooks) {
    let client = stream
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    debug!("Handling request from {}", client);

    let (response, request_line, is_head) = match request::read_head(&mut stream) {
        Ok(None) => {
            debug!("Connection closed by client {}", client);
            return;
        }
        Ok(Some(head)) => match request::parse(&head) {
            Ok(request) => {
                let response = route(&request, root, client);
                (response, request.request_line.clone(), request.is_head())
            }
            Err(e) => (Response::error(e.status), e.request_line, false),
        },
        Err(e) => (Response::error(e.status), e.request_line, false),
    };

    let entry = send(response, &stream, request_line, is_head, client, hooks);
    hooks.logger.log_request(&entry);
}

fn send(
    mut response: Response,
    stream: &TcpStream,
    request_line: String,
    is_head: bool,
    client: IpAddr,
    hooks: &Hooks,
) -> LogEntry {
    hooks.header_policy.apply(&mut response.headers);
    let status = response.status.code();

    let size = match response.write_to(stream, is_head) {
        Ok(sent) => Some(sent).filter(|&n| n > 0),
        Err(e) => {
            warn!("Error sending response to {}: {}", client, e);
            None
        }
    };

    LogEntry {
        client,
        time: Local::now(),
        request_line,
        status,
        size,
    }
}

fn route(request: &Request, root: &Path, client: IpAddr) -> Response {
    if request.method != "GET" && request.method != "HEAD" {
        warn!("Unsupported method from {}: {}", client, request.method);
        return Response::error(HttpStatus::NotImplemented);
    }

    match resolve::resolve(root, &request.target) {
        Ok(Resolved::File(path)) => Response::file(&path).unwrap_or_else(|e| {
            warn!("Error opening {:?} for {}: {}", path, client, e);
            Response::error(HttpStatus::NotFound)
        }),
        Ok(Resolved::Listing { dir, display_path }) => match listing::render(&dir, &display_path) {
            Ok(html) => Response::html(HttpStatus::Ok, html),
            Err(e) => {
                warn!("Error listing {:?} for {}: {}", dir, client, e);
                Response::error(HttpStatus::NotFound)
            }
        },
        Ok(Resolved::Redirect(location)) => Response::redirect(&location),
        Err(ResolveError::Traversal) => {
            warn!("Path traversal attempt from {}: {}", client, request.target);
            Response::error(HttpStatus::NotFound)
        }
        Err(ResolveError::NotFound) => {
            debug!("File not found for {}: {}", client, request.target);
            Response::error(HttpStatus::NotFound)
        }
    }
}
