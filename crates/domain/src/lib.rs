//! # KinderHub Domain
//!
//! Business domain types and models for the KinderHub admin client.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures (API, session storage, logging)
//! - Session types (credentials, user profile, role normalisation)
//! - School resource models (classes, leave requests) and paging types
//!
//! ## Architecture
//! - No dependencies on other KinderHub crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
