//! Configuration structures for the KinderHub client
//!
//! Every section carries serde defaults so a partial file (or no file at
//! all) still produces a usable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_TIMEOUT_MS,
};
use crate::errors::{KinderHubError, Result};
use crate::impl_status_conversions;

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API connection
    pub api: ApiConfig,
    /// Session persistence
    pub storage: StorageConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject configurations the HTTP pipeline cannot work with.
    ///
    /// # Errors
    /// Returns `KinderHubError::Config` when the base URL is not an
    /// absolute http(s) URL or the request timeout is zero.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()
    }
}

/// REST API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every relative request path is joined to
    pub base_url: String,
    /// Ceiling for a single request attempt, in milliseconds
    pub timeout_ms: u64,
    /// Keep cookies between requests (browser `withCredentials`)
    pub with_credentials: bool,
    /// Optional User-Agent header
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            with_credentials: false,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    /// Per-request timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(self.base_url.trim()).map_err(|e| {
            KinderHubError::Config(format!("Invalid API base URL '{}': {e}", self.base_url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(KinderHubError::Config(format!(
                "API base URL must use http or https: '{}'",
                self.base_url
            )));
        }
        if !url.host_str().is_some_and(|host| !host.is_empty()) {
            return Err(KinderHubError::Config(format!(
                "API base URL has no host: '{}'",
                self.base_url
            )));
        }

        if self.timeout_ms == 0 {
            return Err(KinderHubError::Config("API timeout must be greater than zero".into()));
        }

        Ok(())
    }
}

/// Where the session (tokens, profile, role) is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process only; lost on exit
    Memory,
    /// JSON file on disk
    #[default]
    File,
    /// Platform keychain / credential manager
    Keychain,
}

impl_status_conversions!(StorageBackend {
    Memory => "memory",
    File => "file",
    Keychain => "keychain",
});

/// Session persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the session is kept
    pub backend: StorageBackend,
    /// Session file for the `file` backend; a per-user data directory is
    /// used when unset
    pub path: Option<String>,
    /// Keychain service name for the `keychain` backend
    pub service_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            service_name: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
