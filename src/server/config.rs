use clap::Parser;
use std::path::PathBuf;

use super::error::ServerError;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Static file server for local development with caching disabled", long_about = None)]
pub struct ServerConfig {
    /// Address to bind (all interfaces by default)
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Directory to serve (current working directory by default)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Absolute, canonical path of the served directory.
    pub fn root(&self) -> Result<PathBuf, ServerError> {
        let path = match &self.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ServerError::Root {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let root = path.canonicalize().map_err(|source| ServerError::Root {
            path: path.clone(),
            source,
        })?;

        if !root.is_dir() {
            return Err(ServerError::Root {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        Ok(root)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let parsed = ServerConfig::parse_from(["nocache-server"]);
        let default = ServerConfig::default();

        assert_eq!(parsed.bind, default.bind);
        assert_eq!(parsed.port, 8000);
        assert_eq!(parsed.directory, None);
        assert_eq!(default.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn flags_override_defaults() {
        let config =
            ServerConfig::parse_from(["nocache-server", "--bind", "127.0.0.1", "-p", "9000", "-d", "/tmp"]);

        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.directory, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn root_rejects_files_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let mut config = ServerConfig::default();
        config.directory = Some(file);
        assert!(matches!(config.root(), Err(ServerError::Root { .. })));

        config.directory = Some(dir.path().join("missing"));
        assert!(matches!(config.root(), Err(ServerError::Root { .. })));

        config.directory = Some(dir.path().to_path_buf());
        assert_eq!(config.root().unwrap(), dir.path().canonicalize().unwrap());
    }
}
