//! Mock implementations of common traits

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// One mutation observed by [`MockKeyValueStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// `set(key, value)`
    Set {
        /// Key written
        key: String,
        /// Value written
        value: String,
    },
    /// `remove(key)`
    Remove {
        /// Key removed
        key: String,
    },
}

/// In-memory store that records every mutation and can be told to fail
///
/// # Examples
///
/// ```
/// use kinderhub_common::storage::KeyValueStore;
/// use kinderhub_common::testing::MockKeyValueStore;
///
/// let store = MockKeyValueStore::new();
/// store.set("role", "ADMIN").unwrap();
///
/// store.fail_writes(true);
/// assert!(store.set("role", "TEACHER").is_err());
/// assert_eq!(store.snapshot().get("role").map(String::as_str), Some("ADMIN"));
/// ```
#[derive(Debug, Default)]
pub struct MockKeyValueStore {
    data: Mutex<HashMap<String, String>>,
    ops: Mutex<Vec<StorageOp>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockKeyValueStore {
    /// Empty store that accepts every operation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate without recording an operation.
    #[must_use]
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.data.lock().insert(key.to_string(), value.to_string());
        self
    }

    /// Make reads fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes and removals fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Mutations attempted so far, failed ones included
    #[must_use]
    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.lock().clone()
    }

    /// Copy of the stored entries.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.lock().clone()
    }

    fn write_guard(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("mock write failure")));
        }
        Ok(())
    }
}

impl KeyValueStore for MockKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("mock read failure")));
        }
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ops.lock().push(StorageOp::Set { key: key.to_string(), value: value.to_string() });
        self.write_guard()?;
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.ops.lock().push(StorageOp::Remove { key: key.to_string() });
        self.write_guard()?;
        self.data.lock().remove(key);
        Ok(())
    }
}
