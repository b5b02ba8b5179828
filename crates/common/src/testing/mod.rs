//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: polling helper for waiting on concurrent state
//! - **[`mocks`]**: mock implementations of the storage trait
//!
//! Enabled for downstream crates through the `test-utils` feature.

pub mod async_utils;
pub mod mocks;

pub use async_utils::poll_until;
pub use mocks::{MockKeyValueStore, StorageOp};
