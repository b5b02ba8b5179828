//! Authenticated API access for the KinderHub backend
//!
//! - [`ApiClient`]: request pipeline with bearer injection, per-attempt
//!   timeout and single-flight token refresh
//! - [`RefreshCoordinator`]: the `Idle`/`Refreshing` state machine
//! - [`AuthApi`] / [`SessionEndpoints`]: refresh, logout and login calls
//! - [`AuthService`]: session orchestration over the token store

pub mod auth;
pub mod client;
pub mod refresh;
pub mod session;

pub use auth::{username_from_user, AuthService, ProfileUpdate};
pub use client::{ApiClient, ApiClientBuilder};
pub use refresh::{Join, RefreshCoordinator, RefreshGuard, RefreshOutcome};
pub use session::{AuthApi, RefreshedTokens, SessionEndpoints};
