//! Server-local configuration file (§10.4).
//!
//! Mirrors the reference client's `config.ini` discipline on the server
//! side: an optional TOML file with every key defaulted, where a missing
//! file or parse failure silently falls back to defaults rather than
//! aborting startup.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use reactochat_core::config::{LISTEN_BACKLOG, READ_CHUNK_SIZE};

/// Listening port used when neither `--config` nor any CLI positional
/// argument supplies one.
pub const DEFAULT_PORT: u16 = 9000;

/// Log level used when neither `--config` nor `--log-level`/`RUST_LOG`
/// supplies one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Server configuration, all fields optional on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port, overridden by any CLI positional port argument.
    pub port: u16,
    /// Minimum log level, overridden by `--log-level`/`RUST_LOG`.
    pub log_level: String,
    /// `listen(2)` backlog.
    pub backlog: i32,
    /// Bytes read per `recv` call while draining a socket.
    pub read_chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backlog: LISTEN_BACKLOG,
            read_chunk_size: READ_CHUNK_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load from `path` if given, falling back to defaults on any error.
    /// Logs a warning (never aborts) when the file exists but can't be
    /// parsed.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "failed to parse config, using defaults");
                Self::default()
            }),
            Err(err) => {
                warn!(path = %path.display(), %err, "config file not found, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_falls_back_to_defaults() {
        let cfg = ServerConfig::load(None);
        assert_eq!(cfg.backlog, LISTEN_BACKLOG);
        assert_eq!(cfg.read_chunk_size, READ_CHUNK_SIZE);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn toml_can_set_port_and_log_level() {
        let dir = std::env::temp_dir().join("reactochat_config_test_port_loglevel.toml");
        std::fs::write(&dir, "port = 9100\nlog_level = \"debug\"\n").unwrap();
        let cfg = ServerConfig::load(Some(&dir));
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.log_level, "debug");
        std::fs::remove_file(&dir).ok();
    }

    #[test]
    fn nonexistent_file_falls_back_to_defaults() {
        let cfg = ServerConfig::load(Some(Path::new("/nonexistent/reactochat.toml")));
        assert_eq!(cfg.backlog, LISTEN_BACKLOG);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = std::env::temp_dir().join("reactochat_config_test_partial.toml");
        std::fs::write(&dir, "backlog = 64\n").unwrap();
        let cfg = ServerConfig::load(Some(&dir));
        assert_eq!(cfg.backlog, 64);
        assert_eq!(cfg.read_chunk_size, READ_CHUNK_SIZE);
        std::fs::remove_file(&dir).ok();
    }
}
