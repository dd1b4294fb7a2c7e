//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while signing or dispatching a request.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The remote endpoint could not be reached or the connection dropped.
    #[error("Connection failed: {reason}")]
    Connection {
        /// Detailed reason for the connection failure.
        reason: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {reason}")]
    Timeout {
        /// Detailed reason for the timeout.
        reason: String,
    },

    /// A request URL could not be parsed or resolved.
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Detailed reason the URL was rejected.
        reason: String,
    },

    /// The request signature could not be computed.
    ///
    /// Indicates a configuration defect (bad key material, unusable
    /// algorithm). Never retried; a request is never sent unsigned.
    #[error("Unable to sign request: {reason}")]
    Signature {
        /// Detailed reason for the signing failure.
        reason: String,
    },

    /// An I/O failure while sending the request or reading the response.
    #[error("I/O error during request execution: {reason}")]
    Io {
        /// Detailed reason for the I/O failure.
        reason: String,
    },
}

impl TransportError {
    /// Create a connection error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(reason: impl Into<String>) -> Self {
        Self::Timeout {
            reason: reason.into(),
        }
    }

    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a signature error.
    pub fn signature(reason: impl Into<String>) -> Self {
        Self::Signature {
            reason: reason.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io {
            reason: reason.into(),
        }
    }

    /// Whether the executor may retry after this error.
    ///
    /// Signature and URL errors are configuration defects and fail
    /// immediately; everything transport-level is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_classification() {
        assert!(TransportError::connection("reset").is_retryable());
        assert!(TransportError::timeout("deadline").is_retryable());
        assert!(TransportError::io("broken pipe").is_retryable());
        assert!(!TransportError::signature("bad key").is_retryable());
        assert!(!TransportError::invalid_url("x", "no host").is_retryable());
    }
}
