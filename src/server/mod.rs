pub mod config;
pub mod error;
mod handlers;
pub mod headers;
pub mod http_status;
pub mod listing;
pub mod request;
pub mod resolve;
pub mod response;

use log::{debug, error, info};
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::access_log::{ColorLogger, RequestLogger};
use config::ServerConfig;
use error::ServerError;
use handlers::handle_client;
use headers::{HeaderPolicy, NoCacheHeaders};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The two behaviors layered over plain static file serving.
#[derive(Clone)]
pub struct Hooks {
    pub header_policy: Arc<dyn HeaderPolicy>,
    pub logger: Arc<dyn RequestLogger>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            header_policy: Arc::new(NoCacheHeaders),
            logger: Arc::new(ColorLogger::stdout()),
        }
    }
}

/// Stops a running [`HttpServer`] from another thread or a signal handler.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pause after a failed `accept`; only a signal interruption retries at once.
fn accept_retry_delay(e: &std::io::Error) -> Option<Duration> {
    match e.kind() {
        std::io::ErrorKind::Interrupted => None,
        _ => Some(ACCEPT_POLL_INTERVAL),
    }
}

pub struct HttpServer {
    listener: TcpListener,
    root: Arc<PathBuf>,
    hooks: Hooks,
    shutdown: ShutdownHandle,
}

impl HttpServer {
    pub fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let root = config.root()?;
        let addr = config.addr();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;

        info!("Server bound to {} serving {:?}", addr, root);

        Ok(Self {
            listener,
            root: Arc::new(root),
            hooks: Hooks::default(),
            shutdown: ShutdownHandle::default(),
        })
    }

    pub fn with_header_policy(mut self, policy: impl HeaderPolicy + 'static) -> Self {
        self.hooks.header_policy = Arc::new(policy);
        self
    }

    pub fn with_request_logger(mut self, logger: impl RequestLogger + 'static) -> Self {
        self.hooks.logger = Arc::new(logger);
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accepts connections until the shutdown handle fires, one thread per
    /// connection. In-flight requests are left to finish on their own.
    pub fn run(&self) -> Result<(), ServerError> {
        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    if let Err(e) = stream.set_nonblocking(false) {
                        error!("Failed to set blocking mode for {}: {}", addr, e);
                        continue;
                    }

                    let root = Arc::clone(&self.root);
                    let hooks = self.hooks.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("conn-{}", addr))
                        .spawn(move || handle_client(stream, &root, &hooks));
                    if let Err(e) = spawned {
                        error!("Failed to spawn handler for {}: {}", addr, e);
                    }
                }
                Err(e) => {
                    if !matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
                    ) {
                        error!("Error accepting connection: {}", e);
                    }
                    if let Some(delay) = accept_retry_delay(&e) {
                        thread::sleep(delay);
                    }
                }
            }
        }

        info!("Accept loop stopped");
        Ok(())
    }
}
