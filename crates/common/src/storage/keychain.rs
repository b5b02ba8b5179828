//! OS keychain storage backend
//!
//! Each session key becomes one keychain entry under a shared service name
//! (macOS Keychain Access, Windows Credential Manager, Linux Secret
//! Service).
//!
//! ```no_run
//! use kinderhub_common::storage::{KeyValueStore, KeychainStore};
//!
//! let store = KeychainStore::new("kinderhub");
//! store.set("refresh_token", "R1")?;
//! assert_eq!(store.get("refresh_token")?.as_deref(), Some("R1"));
//! # Ok::<(), kinderhub_common::storage::StorageError>(())
//! ```

use keyring::Entry;
use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// Session entries kept in the platform credential store
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    /// # Arguments
    /// * `service_name` - Keychain service identifier (e.g. "kinderhub")
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Keychain service the entries live under.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            StorageError::Keychain(format!("Failed to open keychain entry {key}: {e}"))
        })
    }
}

impl KeyValueStore for KeychainStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        debug!(service = %self.service_name, key = %key, "Reading keychain entry");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                Err(StorageError::Keychain(format!("Failed to retrieve secret for {key}: {e}")))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(service = %self.service_name, key = %key, "Storing keychain entry");

        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Keychain(format!("Failed to store secret for {key}: {e}")))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        debug!(service = %self.service_name, key = %key, "Deleting keychain entry");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                Err(StorageError::Keychain(format!("Failed to delete secret for {key}: {e}")))
            }
        }
    }
}
