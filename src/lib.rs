//! Static file server for local development. Serves a directory over HTTP
//! with client caching disabled and prints a colored access log.

pub mod access_log;
pub mod banner;
pub mod logger;
pub mod server;

pub use access_log::{ColorLogger, LogEntry, RequestLogger, StatusClass};
pub use server::config::ServerConfig;
pub use server::error::ServerError;
pub use server::headers::{HeaderPolicy, Headers, NoCacheHeaders};
pub use server::{HttpServer, ShutdownHandle};
