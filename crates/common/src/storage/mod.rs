//! Key-value persistence for session state
//!
//! The token store writes through a [`KeyValueStore`]; which backend sits
//! behind it is a deployment choice (in-process map, JSON file, or the OS
//! keychain).

pub mod error;
pub mod file;
#[cfg(feature = "platform")]
pub mod keychain;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
#[cfg(feature = "platform")]
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

/// Synchronous string key-value persistence
///
/// Implementations must treat `remove` of a missing key as success.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backend cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write or overwrite a value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value (idempotent).
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backend rejects the delete.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
