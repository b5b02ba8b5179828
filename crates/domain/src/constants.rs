//! Application constants
//!
//! Centralized location for domain-level constants shared by the client
//! crates.

// API defaults
/// Base URL used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
/// Per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Path prefix of the versioned REST API
pub const API_V1_PREFIX: &str = "/api/v1";

// Session storage defaults
/// Keychain service name for session entries
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "kinderhub";
/// File name of the file-backed session
pub const DEFAULT_SESSION_FILE: &str = "session.json";
/// Per-user data directory name
pub const APP_DIR_NAME: &str = "kinderhub";

/// Prefix the backend puts in front of role names (`ROLE_ADMIN`).
pub const ROLE_PREFIX: &str = "ROLE_";

// Client-side listing defaults
/// First page of a client-side listing
pub const DEFAULT_PAGE: usize = 1;
/// Items per page of a client-side listing
pub const DEFAULT_PAGE_SIZE: usize = 10;
