//! Core error types shared by the Identra SDK crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced while assembling SDK building blocks.
///
/// The cache itself never fails: absence is a valid return value, not an
/// error. What can fail is configuration — missing or malformed credentials
/// and invalid component wiring.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A component was configured with invalid or missing settings.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Detailed reason for the configuration failure.
        reason: String,
    },

    /// API credentials were missing, empty, or otherwise unusable.
    #[error("Invalid API credentials: {reason}")]
    InvalidCredentials {
        /// Detailed reason the credentials were rejected.
        reason: String,
    },
}

impl CoreError {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a credentials error.
    pub fn invalid_credentials(reason: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            reason: reason.into(),
        }
    }
}
