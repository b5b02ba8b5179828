//! Session types: bearer credentials and the signed-in user's profile
//!
//! The backend is inconsistent about field names (`accessToken`,
//! `access_token`, `token`), so the extraction helpers here accept every
//! spelling it has been seen to use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::ROLE_PREFIX;

/// Opaque bearer credentials
///
/// An empty access token means "unauthenticated", whatever the refresh
/// token holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token; empty when signed out
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
}

impl Credentials {
    /// Credentials from both tokens.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Whether a refresh token is held.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Access/refresh pair read out of a login or refresh response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    /// Access token; empty when absent
    pub access: String,
    /// Refresh token; empty when absent
    pub refresh: String,
}

impl TokenPair {
    /// Pull tokens from a response body, looking inside a `data` envelope
    /// when the top level carries none. Missing tokens come back empty.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let top = Self::from_object(payload);
        if !top.access.is_empty() || !top.refresh.is_empty() {
            return top;
        }
        payload.get("data").map(Self::from_object).unwrap_or_default()
    }

    fn from_object(value: &Value) -> Self {
        Self {
            access: first_str(value, &["accessToken", "access_token", "token"]),
            refresh: first_str(value, &["refreshToken", "refresh_token"]),
        }
    }
}

/// Strip the backend's `ROLE_` prefix (`ROLE_ADMIN` → `ADMIN`).
#[must_use]
pub fn normalize_role(raw: &str) -> String {
    raw.strip_prefix(ROLE_PREFIX).unwrap_or(raw).to_string()
}

/// Profile of the signed-in account, persisted for display only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// Account id
    pub id: Option<i64>,
    /// Login name
    pub username: String,
    /// Full name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Avatar URL
    pub avatar: String,
    /// Role without the `ROLE_` prefix
    pub role: String,
    /// Account creation timestamp
    pub created_at: Option<String>,
    /// Gender, when given
    pub gender: Option<String>,
    /// Health records on file
    pub health_records: i64,
    /// Days with recorded activity
    pub activity_days: i64,
}

impl UserProfile {
    /// Build the profile from a login response body.
    #[must_use]
    pub fn from_login_payload(payload: &Value, role: &str) -> Self {
        Self {
            id: payload.get("id").and_then(Value::as_i64),
            username: first_str(payload, &["username"]),
            full_name: first_str(payload, &["fullName"]),
            email: first_str(payload, &["email"]),
            phone: first_str(payload, &["phone"]),
            avatar: first_str(payload, &["avatarUrl", "avatar"]),
            role: role.to_string(),
            created_at: non_empty(first_str(payload, &["createdAt"])),
            gender: non_empty(first_str(payload, &["gender"])),
            health_records: payload.get("healthRecords").and_then(Value::as_i64).unwrap_or(0),
            activity_days: payload.get("activityDays").and_then(Value::as_i64).unwrap_or(0),
        }
    }
}

/// Role field of a login response, normalised.
#[must_use]
pub fn role_from_payload(payload: &Value) -> String {
    normalize_role(&first_str(payload, &["role", "roleName"]))
}

/// First non-empty string among `keys`.
fn first_str(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
