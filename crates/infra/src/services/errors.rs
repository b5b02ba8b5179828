//! User-facing service errors

use thiserror::Error;

use crate::http::HttpError;

/// Failure of a service operation, carrying the message to show the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// Message to show the user
    pub message: String,
    /// HTTP status, when the backend answered
    pub status: Option<u16>,
}

impl ServiceError {
    /// Error raised before any request was made (missing id, ...).
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    /// Message from the server's `message`, then its `error`. A status
    /// error with neither gets `fallback`; a failure with no response
    /// (timeout, transport) keeps its own description.
    #[must_use]
    pub fn from_http(err: &HttpError, fallback: &str) -> Self {
        let message = err
            .body_field("message")
            .or_else(|| err.body_field("error"))
            .map(str::to_string)
            .unwrap_or_else(|| match err {
                HttpError::Status { .. } => fallback.to_string(),
                other => other.to_string(),
            });
        Self { message, status: err.status() }
    }
}

/// Result of a service operation
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
