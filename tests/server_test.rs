//! Drives a real server on an ephemeral port over plain TCP.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use nocache_server::{HttpServer, LogEntry, RequestLogger, ServerConfig, ShutdownHandle};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<LogEntry>>>);

impl RequestLogger for Captured {
    fn log_request(&self, entry: &LogEntry) {
        self.0.lock().unwrap().push(entry.clone());
    }
}

impl Captured {
    /// Waits for the handler thread to log, since it logs after the response is sent.
    fn wait_for(&self, count: usize) -> Vec<LogEntry> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let entries = self.0.lock().unwrap().clone();
            if entries.len() >= count || Instant::now() > deadline {
                return entries;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<thread::JoinHandle<()>>,
    log: Captured,
    dir: tempfile::TempDir,
}

impl TestServer {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "console.log('v1');").unwrap();
        fs::write(dir.path().join("logo.bin"), [0u8, 159, 146, 150, 255]).unwrap();
        fs::create_dir(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("site").join("index.html"), "<h1>home</h1>").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets").join("main.css"), "p {}").unwrap();

        let config = ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 0,
            directory: Some(dir.path().to_path_buf()),
        };
        let log = Captured::default();
        let server = HttpServer::bind(&config)
            .unwrap()
            .with_request_logger(log.clone());
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run().unwrap());

        Self {
            addr,
            shutdown,
            thread: Some(thread),
            log,
            dir,
        }
    }

    fn send(&self, raw: &str) -> (String, Vec<u8>) {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();

        let end = response
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response head")
            + 4;
        let head = String::from_utf8(response[..end].to_vec()).unwrap();
        (head, response[end..].to_vec())
    }

    fn get(&self, path: &str) -> (String, Vec<u8>) {
        self.send(&format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn status(head: &str) -> u16 {
    head.split_whitespace().nth(1).unwrap().parse().unwrap()
}

fn header_values<'a>(head: &'a str, name: &str) -> Vec<&'a str> {
    head.lines()
        .filter_map(|line| line.split_once(": "))
        .filter(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
        .collect()
}

fn assert_no_cache(head: &str) {
    assert_eq!(
        header_values(head, "Cache-Control"),
        vec!["no-store, no-cache, must-revalidate, max-age=0"],
        "{}",
        head
    );
    assert_eq!(header_values(head, "Pragma"), vec!["no-cache"]);
    assert_eq!(header_values(head, "Expires"), vec!["0"]);
}

#[test]
fn serves_file_bytes_with_type_and_length() {
    let server = TestServer::start();

    let (head, body) = server.get("/logo.bin");
    assert_eq!(status(&head), 200);
    assert_eq!(body, vec![0u8, 159, 146, 150, 255]);
    assert_eq!(header_values(&head, "Content-Length"), vec!["5"]);
    assert_eq!(
        header_values(&head, "Content-Type"),
        vec!["application/octet-stream"]
    );
    assert_no_cache(&head);

    let (head, body) = server.get("/app.js");
    assert_eq!(status(&head), 200);
    assert_eq!(body, b"console.log('v1');");
}

#[test]
fn every_status_carries_no_cache_headers() {
    let server = TestServer::start();

    let cases = [
        ("GET /app.js HTTP/1.1\r\n\r\n", 200),
        ("GET /assets/ HTTP/1.1\r\n\r\n", 200),
        ("GET /site HTTP/1.1\r\n\r\n", 301),
        ("GET /missing.html HTTP/1.1\r\n\r\n", 404),
        ("GET /../secret HTTP/1.1\r\n\r\n", 404),
        ("garbage\r\n\r\n", 400),
        ("DELETE /app.js HTTP/1.1\r\n\r\n", 501),
    ];

    for (raw, expected) in cases {
        let (head, _) = server.send(raw);
        assert_eq!(status(&head), expected, "{}", raw);
        assert_no_cache(&head);
    }
}

#[test]
fn directory_redirects_then_serves_index_or_listing() {
    let server = TestServer::start();

    let (head, body) = server.get("/site");
    assert_eq!(status(&head), 301);
    assert_eq!(header_values(&head, "Location"), vec!["/site/"]);
    assert!(body.is_empty());

    let (head, body) = server.get("/site/");
    assert_eq!(status(&head), 200);
    assert_eq!(body, b"<h1>home</h1>");

    let (head, body) = server.get("/assets/");
    assert_eq!(status(&head), 200);
    assert!(header_values(&head, "Content-Type")[0].starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Directory listing for /assets/"));
    assert!(html.contains("<a href=\"main.css\">main.css</a>"));
}

#[test]
fn dot_dot_inside_root_serves_the_normalized_file() {
    let server = TestServer::start();

    let (head, body) = server.get("/site/../app.js");
    assert_eq!(status(&head), 200);
    assert_eq!(body, b"console.log('v1');");

    let (head, _) = server.get("/site/../../app.js");
    assert_eq!(status(&head), 404);
}

#[test]
fn head_returns_headers_without_body() {
    let server = TestServer::start();

    let (head, body) = server.send("HEAD /app.js HTTP/1.1\r\n\r\n");
    assert_eq!(status(&head), 200);
    assert_eq!(header_values(&head, "Content-Length"), vec!["18"]);
    assert!(body.is_empty());
    assert_no_cache(&head);
}

#[test]
fn conditional_requests_never_get_not_modified() {
    let server = TestServer::start();
    let path = server.dir.path().join("app.js");

    for version in 1..=3 {
        let content = format!("console.log('v{}');", version);
        fs::write(&path, &content).unwrap();

        let (head, body) = server.send(
            "GET /app.js HTTP/1.1\r\n\
             If-Modified-Since: Fri, 31 Dec 2100 23:59:59 GMT\r\n\
             If-None-Match: *\r\n\r\n",
        );
        assert_eq!(status(&head), 200);
        assert_eq!(body, content.as_bytes());
    }
}

#[test]
fn each_request_logs_exactly_one_entry() {
    let server = TestServer::start();

    server.get("/app.js");
    server.get("/nope");
    server.send("POST /app.js HTTP/1.1\r\n\r\n");

    let mut entries = server.log.wait_for(3);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(server.log.0.lock().unwrap().len(), 3);

    entries.sort_by_key(|e| e.status);
    let summary: Vec<(u16, &str)> = entries
        .iter()
        .map(|e| (e.status, e.request_line.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (200, "GET /app.js HTTP/1.1"),
            (404, "GET /nope HTTP/1.1"),
            (501, "POST /app.js HTTP/1.1"),
        ]
    );
    assert!(entries.iter().all(|e| e.client.is_loopback()));
}

#[test]
fn silent_connection_is_not_logged() {
    let server = TestServer::start();

    drop(TcpStream::connect(server.addr).unwrap());
    server.get("/app.js");

    let entries = server.log.wait_for(1);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(entries.len(), 1);
    assert_eq!(server.log.0.lock().unwrap().len(), 1);
}

#[test]
fn shutdown_stops_accept_loop() {
    let mut server = TestServer::start();
    server.get("/app.js");

    server.shutdown.shutdown();
    let thread = server.thread.take().unwrap();
    let started = Instant::now();
    thread.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn bind_failure_is_reported() {
    let server = TestServer::start();
    let config = ServerConfig {
        bind: "127.0.0.1".to_string(),
        port: server.addr.port(),
        directory: Some(server.dir.path().to_path_buf()),
    };

    match HttpServer::bind(&config) {
        Err(nocache_server::ServerError::Bind { addr, .. }) => {
            assert_eq!(addr, format!("127.0.0.1:{}", server.addr.port()));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("second bind on the same port succeeded"),
    }
}
