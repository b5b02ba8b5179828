//! Session credentials
//!
//! - [`TokenStore`]: the single source of truth for access/refresh tokens,
//!   the signed-in profile and role, written through to a
//!   [`KeyValueStore`](crate::storage::KeyValueStore)
//! - [`CredentialStore`]: the narrow read/write view the HTTP pipeline is
//!   handed at construction
//! - [`jwt`]: unverified claim decoding for display purposes
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use kinderhub_common::auth::{CredentialStore, TokenStore};
//! use kinderhub_common::storage::MemoryStore;
//!
//! let store = TokenStore::load(Arc::new(MemoryStore::new()));
//! store.set_tokens("A1", "R1");
//! assert!(store.is_authenticated());
//!
//! store.clear();
//! assert_eq!(store.access_token(), "");
//! ```

pub mod jwt;
pub mod token_store;
pub mod traits;

pub use token_store::{TokenStore, ACCESS_TOKEN_KEY, AUTH_USER_KEY, REFRESH_TOKEN_KEY, ROLE_KEY};
pub use traits::CredentialStore;
