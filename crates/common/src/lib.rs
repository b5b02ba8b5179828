//! Modular common utilities shared across KinderHub crates.
//!
//! # Feature Tiers
//!
//! The session core (storage backends, token store, progress tracking, JWT
//! claim decoding) is always available. Cargo features opt into the rest:
//! - `observability`: `tracing-subscriber` installation
//! - `platform`: OS keychain backed session storage
//! - `test-utils`: mocks and async polling helpers for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod progress;
pub mod storage;

#[cfg(feature = "observability")]
pub mod observability;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{CredentialStore, TokenStore};
pub use progress::{LoadingBar, NoopProgress, ProgressIndicator};
#[cfg(feature = "platform")]
pub use storage::KeychainStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
