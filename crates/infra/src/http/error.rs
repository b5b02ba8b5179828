//! HTTP error taxonomy
//!
//! Provides error classification for pipeline failures. Only
//! [`HttpError::Status`] with status 401 engages the token refresh
//! protocol; everything else is handed back to the caller untouched.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Categories of HTTP errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 - access token missing, invalid or expired
    Authentication,
    /// 403 - authenticated but not allowed
    Authorization,
    /// 429
    RateLimit,
    /// 5xx, or a body that could not be decoded
    Server,
    /// Remaining 4xx
    Client,
    /// No response: connect failure, reset, timeout
    Network,
    /// The request could not be built
    Config,
}

/// Failure of one HTTP exchange
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// No response within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response. `body` holds the parsed JSON body, the raw text as
    /// a JSON string, or `null` when empty.
    #[error("{method} {url} returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request method
        method: String,
        /// Request URL
        url: String,
        /// Decoded error body
        body: Value,
    },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl HttpError {
    /// Shorthand for building a [`HttpError::Status`].
    #[must_use]
    pub fn status_error(
        status: u16,
        method: impl Into<String>,
        url: impl Into<String>,
        body: Value,
    ) -> Self {
        Self::Status { status, method: method.into(), url: url.into(), body }
    }

    /// HTTP status when a response was received
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the authentication failure that triggers a refresh.
    ///
    /// Every 401 counts, whether the token expired or was rejected for
    /// another reason.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(401)
    }

    /// Error body when it is a JSON object
    #[must_use]
    pub fn body_json(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } if body.is_object() => Some(body),
            _ => None,
        }
    }

    /// String field of the JSON error body (`message`, `error`, ...)
    #[must_use]
    pub fn body_field(&self, field: &str) -> Option<&str> {
        self.body_json()?.get(field)?.as_str().filter(|s| !s.is_empty())
    }

    /// Coarse classification for logging and mapping.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Status { status, .. } => match *status {
                401 => ErrorCategory::Authentication,
                403 => ErrorCategory::Authorization,
                429 => ErrorCategory::RateLimit,
                s if s >= 500 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::Timeout(_) | Self::Transport(_) => ErrorCategory::Network,
            Self::Decode(_) => ErrorCategory::Server,
            Self::InvalidRequest(_) => ErrorCategory::Config,
        }
    }
}

impl HttpError {
    /// Classify a reqwest failure; `timeout` is the ceiling the client was
    /// configured with, since reqwest does not report it.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
