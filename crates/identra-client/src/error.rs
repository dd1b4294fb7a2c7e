//! Client error types and the API error wire format.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use identra_core::CoreError;
use identra_transport::TransportError;

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A structured error body returned by the API for non-2xx responses.
///
/// Wire format: `{ "status": ..., "code": ..., "message": ...,
/// "developerMessage": ..., "moreInfo": ..., "requestId": ... }`. Missing
/// fields default rather than failing the parse — an error response must
/// never be swallowed just because its body is incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: u16,
    /// Domain-specific error code.
    pub code: i64,
    /// End-user facing message.
    pub message: String,
    /// Developer facing message with remediation detail.
    pub developer_message: String,
    /// URI pointing at documentation for this error.
    pub more_info: String,
    /// Server-assigned id of the failed request, when reported.
    pub request_id: Option<String>,
}

impl ApiError {
    /// Build from an HTTP status and an optional parsed JSON body.
    pub(crate) fn from_body(http_status: u16, body: Option<&Value>) -> Self {
        let get_str = |name: &str| -> Option<String> {
            body.and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let get_int = |name: &str| -> Option<i64> {
            body.and_then(|v| v.get(name)).and_then(Value::as_i64)
        };
        Self {
            status: get_int("status").map_or(http_status, |s| s as u16),
            code: get_int("code").unwrap_or_else(|| i64::from(http_status)),
            message: get_str("message").unwrap_or_else(|| "An error occurred.".to_string()),
            developer_message: get_str("developerMessage").unwrap_or_default(),
            more_info: get_str("moreInfo").unwrap_or_default(),
            request_id: get_str("requestId"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP {}, code {}: {}",
            self.status, self.code, self.message
        )?;
        if !self.developer_message.is_empty() {
            write!(f, " ({})", self.developer_message)?;
        }
        Ok(())
    }
}

/// Errors surfaced by the data store and client facade.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A transport-level failure (connection, timeout, signing).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The API answered with a structured error body.
    #[error("API error: {0}")]
    Api(ApiError),

    /// A response body could not be parsed or rendered.
    #[error("Unable to process message body: {reason}")]
    Serialization {
        /// Detailed reason for the serialization failure.
        reason: String,
    },

    /// The client was built or used with invalid settings.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Detailed reason for the configuration failure.
        reason: String,
    },

    /// A resource was used in a state that does not support the operation.
    #[error("Illegal resource state: {reason}")]
    IllegalState {
        /// Detailed reason for the state violation.
        reason: String,
    },
}

impl ClientError {
    /// Create a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an illegal-state error.
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self::IllegalState {
            reason: reason.into(),
        }
    }

    /// The structured API error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(error: CoreError) -> Self {
        Self::Configuration {
            reason: error.to_string(),
        }
    }
}
