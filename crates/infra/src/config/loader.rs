//! Configuration loader
//!
//! ## Loading Strategy
//! 1. `.env` in the working directory is applied to the process
//!    environment (best effort)
//! 2. When `KINDERHUB_API_BASE_URL` is set, the configuration comes from
//!    environment variables
//! 3. Otherwise the standard locations are probed for a config file
//! 4. With no file either, defaults are used
//!
//! ## Environment Variables
//! - `KINDERHUB_API_BASE_URL`: REST API base URL
//! - `KINDERHUB_API_TIMEOUT_MS`: per-request timeout in milliseconds
//! - `KINDERHUB_WITH_CREDENTIALS`: keep cookies between requests (true/false)
//! - `KINDERHUB_USER_AGENT`: User-Agent header
//! - `KINDERHUB_STORAGE_BACKEND`: `memory`, `file` or `keychain`
//! - `KINDERHUB_STORAGE_PATH`: session file for the `file` backend
//! - `KINDERHUB_KEYCHAIN_SERVICE`: keychain service name
//! - `KINDERHUB_LOG_LEVEL`: default log filter
//! - `KINDERHUB_LOG_JSON`: JSON log lines (true/false)
//!
//! ## File Locations
//! `kinderhub.toml`, `kinderhub.json`, `config.toml` and `config.json` are
//! looked up in the working directory, its parent and grandparent, then
//! next to the executable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kinderhub_common::{FileStore, KeyValueStore, KeychainStore, MemoryStore};
use kinderhub_domain::constants::{APP_DIR_NAME, DEFAULT_SESSION_FILE};
use kinderhub_domain::{
    ApiConfig, Config, KinderHubError, LoggingConfig, Result, StorageBackend, StorageConfig,
};

use crate::errors::InfraError;

const BASE_URL_VAR: &str = "KINDERHUB_API_BASE_URL";
const FILE_NAMES: [&str; 4] = ["kinderhub.toml", "kinderhub.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `KinderHubError::Config` when an environment value or the
/// probed file is invalid, or the result fails [`Config::validate`].
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "applied .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }

    let config = if std::env::var_os(BASE_URL_VAR).is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No configuration found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `KINDERHUB_API_BASE_URL` is required; every other variable falls back
/// to its default.
///
/// # Errors
/// Returns `KinderHubError::Config` if the base URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var(BASE_URL_VAR)?;
    let api_defaults = ApiConfig::default();
    let timeout_ms = match optional_var("KINDERHUB_API_TIMEOUT_MS") {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            KinderHubError::Config(format!("Invalid KINDERHUB_API_TIMEOUT_MS '{raw}': {e}"))
        })?,
        None => api_defaults.timeout_ms,
    };

    let storage_defaults = StorageConfig::default();
    let backend = match optional_var("KINDERHUB_STORAGE_BACKEND") {
        Some(raw) => raw.trim().parse::<StorageBackend>().map_err(|_| {
            KinderHubError::Config(format!("Unknown storage backend: '{raw}'"))
        })?,
        None => storage_defaults.backend,
    };

    let logging_defaults = LoggingConfig::default();

    Ok(Config {
        api: ApiConfig {
            base_url,
            timeout_ms,
            with_credentials: env_bool("KINDERHUB_WITH_CREDENTIALS", api_defaults.with_credentials),
            user_agent: optional_var("KINDERHUB_USER_AGENT"),
        },
        storage: StorageConfig {
            backend,
            path: optional_var("KINDERHUB_STORAGE_PATH"),
            service_name: optional_var("KINDERHUB_KEYCHAIN_SERVICE")
                .unwrap_or(storage_defaults.service_name),
        },
        logging: LoggingConfig {
            level: optional_var("KINDERHUB_LOG_LEVEL").unwrap_or(logging_defaults.level),
            json: env_bool("KINDERHUB_LOG_JSON", logging_defaults.json),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. TOML and JSON are
/// supported, chosen by file extension; missing sections take defaults.
///
/// # Errors
/// Returns `KinderHubError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KinderHubError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KinderHubError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KinderHubError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KinderHubError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KinderHubError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(KinderHubError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    // The iterator borrows `dirs`, so finish it before `dirs` drops.
    let found = candidates_in(&dirs).find(|path| path.is_file());
    found
}

fn candidates_in(dirs: &[PathBuf]) -> impl Iterator<Item = PathBuf> + '_ {
    dirs.iter().flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
}

/// `<data dir>/kinderhub/session.json`, or the working directory when the
/// platform has no data directory.
#[must_use]
pub fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_default()
        .join(DEFAULT_SESSION_FILE)
}

/// Open the session backend described by `config`.
///
/// # Errors
/// Returns `KinderHubError::Storage` when the session file cannot be
/// opened.
pub fn build_storage(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => {
            let path = config.path.as_ref().map_or_else(default_session_path, PathBuf::from);
            tracing::debug!(path = %path.display(), "opening session file");
            Arc::new(FileStore::open(path).map_err(InfraError::from)?)
        }
        StorageBackend::Keychain => Arc::new(KeychainStore::new(config.service_name.clone())),
    };
    Ok(store)
}

fn env_var(key: &str) -> Result<String> {
    optional_var(key).ok_or_else(|| {
        KinderHubError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-blank
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
