//! Error types
//!
//! `OpenError` covers a single `/open` request and never leaves the handler.
//! `ServerError` covers startup and is returned from `main`.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure classes of a remote file open request
#[derive(Debug, Error)]
pub enum OpenError {
    /// The `path` query parameter is absent or empty
    #[error("no path query parameter is found")]
    MissingPathParameter,

    /// The path could not be opened as a readable regular file
    #[error("file '{}' is unavailable: {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OpenError {
    pub(crate) fn unavailable(path: &Path, source: io::Error) -> Self {
        Self::FileUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("unsupported job backend '{0}'")]
    UnsupportedBackend(String),

    #[error("failed to initialise logger: {0}")]
    Logger(#[source] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
