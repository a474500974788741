//! Reactochat Core Error Types
//!
//! Error taxonomy for the reactor, demultiplexer, and connection registry.

use std::io;
use thiserror::Error;

/// Main error type for reactor-level operations.
#[derive(Error, Debug)]
pub enum ReactorError {
    /// IO error during socket or epoll operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The listening socket could not be created, bound, or set to listen.
    #[error("failed to create listening socket: {0}")]
    ListenFailed(io::Error),

    /// Registering a handler with the demultiplexer failed.
    #[error("failed to register fd {fd}: {source}")]
    Registration {
        /// File descriptor that failed to register.
        fd: i32,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The peer closed the connection (a 0-byte read or write).
    #[error("peer closed connection on fd {0}")]
    PeerClosed(i32),

    /// A read or write failed for a reason other than would-block.
    #[error("transport error on fd {fd}: {source}")]
    Transport {
        /// File descriptor the error occurred on.
        fd: i32,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Result type alias for reactor-level operations.
pub type Result<T> = std::result::Result<T, ReactorError>;

impl ReactorError {
    /// True if this error represents an expected, non-fatal connection close.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::PeerClosed(_) | Self::Transport { .. })
    }
}
