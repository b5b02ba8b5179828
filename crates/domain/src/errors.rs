//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for KinderHub
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KinderHubError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend unreachable or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Not signed in, or the session could not be renewed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Session persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure inside the client
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for KinderHub operations
pub type Result<T> = std::result::Result<T, KinderHubError>;
