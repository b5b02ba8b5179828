//! Token store with write-through persistence
//!
//! Holds the session in memory and mirrors every change to a
//! [`KeyValueStore`]. Persistence failures are logged and swallowed: the
//! in-memory state is always updated, so callers never see a failed token
//! write.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::traits::CredentialStore;
use crate::storage::KeyValueStore;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the JSON-encoded profile
pub const AUTH_USER_KEY: &str = "auth_user";
/// Storage key for the normalised role
pub const ROLE_KEY: &str = "role";

#[derive(Debug, Default, Clone)]
struct SessionState {
    access_token: String,
    refresh_token: String,
    user: Option<Value>,
    role: String,
}

/// Process-wide session state
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TokenStore")
            .field("has_access_token", &!state.access_token.is_empty())
            .field("has_refresh_token", &!state.refresh_token.is_empty())
            .field("has_user", &state.user.is_some())
            .field("role", &state.role)
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Empty store writing through to `storage`; nothing is read back.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage, state: RwLock::new(SessionState::default()) }
    }

    /// Store initialised from whatever `storage` already holds.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let store = Self::new(storage);
        store.reload();
        store
    }

    /// Re-read the session from persistence, replacing the in-memory copy.
    ///
    /// An unreadable key counts as absent; an `auth_user` value that is not
    /// valid JSON yields no profile.
    pub fn reload(&self) {
        let user = self.read_key(AUTH_USER_KEY).and_then(|raw| {
            serde_json::from_str::<Value>(&raw)
                .map_err(|e| warn!(error = %e, "Stored profile is not valid JSON; ignoring it"))
                .ok()
                .filter(|v| !v.is_null())
        });

        let state = SessionState {
            access_token: self.read_key(ACCESS_TOKEN_KEY).unwrap_or_default(),
            refresh_token: self.read_key(REFRESH_TOKEN_KEY).unwrap_or_default(),
            user,
            role: self.read_key(ROLE_KEY).unwrap_or_default(),
        };

        debug!(
            authenticated = !state.access_token.is_empty(),
            has_refresh_token = !state.refresh_token.is_empty(),
            "Session loaded from storage"
        );
        *self.state.write() = state;
    }

    /// Current access token; empty when signed out
    #[must_use]
    pub fn access_token(&self) -> String {
        self.state.read().access_token.clone()
    }

    /// Current refresh token; empty when none is held
    #[must_use]
    pub fn refresh_token(&self) -> String {
        self.state.read().refresh_token.clone()
    }

    /// True iff the access token is non-empty.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.state.read().access_token.is_empty()
    }

    /// Overwrite both tokens; an empty value removes it from storage.
    pub fn set_tokens(&self, access: &str, refresh: &str) {
        {
            let mut state = self.state.write();
            state.access_token = access.to_string();
            state.refresh_token = refresh.to_string();
        }
        self.write_key(ACCESS_TOKEN_KEY, access);
        self.write_key(REFRESH_TOKEN_KEY, refresh);
    }

    /// Raw profile JSON
    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.state.read().user.clone()
    }

    /// Profile decoded into `T`; `None` when absent or of another shape.
    #[must_use]
    pub fn user_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.user().and_then(|v| serde_json::from_value(v).ok())
    }

    /// Replace the profile; `None` clears it.
    pub fn set_user<T: Serialize>(&self, user: Option<&T>) {
        let value = match user.map(serde_json::to_value).transpose() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Profile could not be serialised; clearing it");
                None
            }
        };
        self.set_user_value(value);
    }

    /// Replace the profile with raw JSON; `None` (or `null`) clears it.
    pub fn set_user_value(&self, user: Option<Value>) {
        let user = user.filter(|v| !v.is_null());
        let serialized = user.as_ref().map(Value::to_string).unwrap_or_default();
        self.state.write().user = user;
        self.write_key(AUTH_USER_KEY, &serialized);
    }

    /// Normalised role of the signed-in account
    #[must_use]
    pub fn role(&self) -> String {
        self.state.read().role.clone()
    }

    /// Store the role and persist it.
    pub fn set_role(&self, role: &str) {
        self.state.write().role = role.to_string();
        self.write_key(ROLE_KEY, role);
    }

    /// Drop tokens, profile and role.
    pub fn clear(&self) {
        self.set_tokens("", "");
        self.set_user_value(None);
        self.set_role("");
        debug!("Session cleared");
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read session key; treating as absent");
                None
            }
        }
    }

    fn write_key(&self, key: &str, value: &str) {
        let result =
            if value.is_empty() { self.storage.remove(key) } else { self.storage.set(key, value) };
        if let Err(e) = result {
            warn!(key, error = %e, "Failed to persist session key; keeping in-memory value");
        }
    }
}

impl CredentialStore for TokenStore {
    fn access_token(&self) -> String {
        TokenStore::access_token(self)
    }

    fn refresh_token(&self) -> String {
        TokenStore::refresh_token(self)
    }

    fn store_tokens(&self, access: &str, refresh: &str) {
        self.set_tokens(access, refresh);
    }

    fn clear(&self) {
        TokenStore::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStore;

    fn memory() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_set_tokens_writes_through() {
        let storage = memory();
        let store = TokenStore::new(storage.clone());

        store.set_tokens("A1", "R1");
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A1"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("R1"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_empty_token_removes_key() {
        let storage = memory();
        let store = TokenStore::new(storage.clone());
        store.set_tokens("A1", "R1");

        store.set_tokens("A2", "");
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert_eq!(store.refresh_token(), "");
        assert_eq!(store.access_token(), "A2");
    }

    #[test]
    fn test_unauthenticated_without_access_token() {
        let store = TokenStore::new(memory());
        store.set_tokens("", "R1");
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_load_reads_existing_session() {
        let storage = memory();
        storage.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        storage.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        storage.set(AUTH_USER_KEY, r#"{"username":"admin"}"#).unwrap();
        storage.set(ROLE_KEY, "ADMIN").unwrap();

        let store = TokenStore::load(storage);
        assert_eq!(store.access_token(), "A1");
        assert_eq!(store.refresh_token(), "R1");
        assert_eq!(store.user(), Some(json!({"username": "admin"})));
        assert_eq!(store.role(), "ADMIN");
    }

    #[test]
    fn test_unreadable_profile_yields_none() {
        let storage = memory();
        storage.set(AUTH_USER_KEY, "{not json").unwrap();

        let store = TokenStore::load(storage);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_typed_profile_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Profile {
            username: String,
        }

        let storage = memory();
        let store = TokenStore::new(storage.clone());
        store.set_user(Some(&Profile { username: "cô lan".into() }));

        assert_eq!(store.user_as::<Profile>(), Some(Profile { username: "cô lan".into() }));
        assert!(storage.get(AUTH_USER_KEY).unwrap().is_some());

        store.set_user::<Profile>(None);
        assert_eq!(storage.get(AUTH_USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let storage = memory();
        let store = TokenStore::new(storage.clone());
        store.set_tokens("A1", "R1");
        store.set_user_value(Some(json!({"id": 1})));
        store.set_role("TEACHER");

        store.clear();

        assert_eq!(store.access_token(), "");
        assert_eq!(store.refresh_token(), "");
        assert_eq!(store.user(), None);
        assert_eq!(store.role(), "");
        assert!(storage.is_empty());
    }

    #[test]
    fn test_debug_hides_token_values() {
        let store = TokenStore::new(memory());
        store.set_tokens("secret-access", "secret-refresh");
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("has_access_token: true"));
    }
}
