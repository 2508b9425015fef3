//! Error types for jot-core

use thiserror::Error;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Result type alias using jot-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jot-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Classified remote call failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Authentication or credential storage failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// `SQLite` error from the local cache
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl Error {
    /// Whether this failure is plausibly caused by transient network or
    /// service conditions (network, 5xx, timeout).
    pub const fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_connectivity(),
            Self::Auth(AuthError::Transport(error)) => error.is_connectivity(),
            _ => false,
        }
    }

    /// The classified transport failure behind this error, if any.
    pub const fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(error) | Self::Auth(AuthError::Transport(error)) => Some(error),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Task(error.to_string())
    }
}
