//! Classified transport failures.

use thiserror::Error;

/// Result type for a single remote call.
pub type TransportResult<T> = Result<T, TransportError>;

/// A remote call failure, classified so callers can decide whether a retry,
/// an offline queue, or an immediate report is appropriate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Generic connectivity fault (DNS, connection refused, reset).
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP 5xx.
    #[error("Server error ({code}): {message}")]
    Server { code: u16, message: String },
    /// Client-side request timeout.
    #[error("Request timed out")]
    Timeout,
    /// HTTP 4xx.
    #[error("Client error ({code}): {message}")]
    Client { code: u16, message: String },
    /// Payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    pub fn client(code: u16, message: impl Into<String>) -> Self {
        Self::Client {
            code,
            message: message.into(),
        }
    }

    /// Classify a non-2xx HTTP status with its body text.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        if code >= 500 {
            Self::server(code, message)
        } else {
            Self::client(code, message)
        }
    }

    /// Only network, 5xx, and timeout failures are worth retrying.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. } | Self::Timeout)
    }

    /// Connectivity-class failures trigger offline queuing for writes.
    pub const fn is_connectivity(&self) -> bool {
        self.is_retryable()
    }

    /// HTTP 401.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Client { code: 401, .. })
    }

    /// Numeric HTTP status when the failure came from a response.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { code, .. } | Self::Client { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Serialization(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}
