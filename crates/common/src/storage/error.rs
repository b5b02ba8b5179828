//! Storage error types

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Platform keychain failure
    #[error("Keychain error: {0}")]
    Keychain(String),

    /// Session file that exists but cannot be read back
    #[error("Corrupt session file {path}: {reason}")]
    Corrupt {
        /// File location
        path: String,
        /// Parser message
        reason: String,
    },

    /// Backend settings that cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File system failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Session file that is not a JSON object of strings
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Only I/O interruptions and keychain access failures qualify; a
    /// corrupt file stays corrupt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            Self::Keychain(_) => true,
            Self::Corrupt { .. } | Self::InvalidConfig(_) | Self::SerdeJson(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Corrupt { path: "/tmp/s.json".into(), reason: "not an object".into() };
        assert_eq!(err.to_string(), "Corrupt session file /tmp/s.json: not an object");

        let err = StorageError::Keychain("locked".into());
        assert_eq!(err.to_string(), "Keychain error: locked");
    }

    #[test]
    fn test_retryable_classification() {
        let interrupted = StorageError::from(std::io::Error::from(std::io::ErrorKind::Interrupted));
        assert!(interrupted.is_retryable());

        let missing = StorageError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!missing.is_retryable());

        assert!(!StorageError::InvalidConfig("x".into()).is_retryable());
    }
}
