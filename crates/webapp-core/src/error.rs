//! Error types for webapp-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for webapp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the webapp HTTP server
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Invalid path or route pattern
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Route pattern registered twice
    #[error("Duplicate route: {0}")]
    DuplicateRoute(String),

    /// Listen address could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
