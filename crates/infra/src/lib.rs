//! # KinderHub Infrastructure
//!
//! Everything that talks to the outside world on behalf of the admin
//! client.
//!
//! This crate contains:
//! - The HTTP transport (`reqwest`) and request/response model
//! - The authenticated request pipeline with single-flight token refresh
//! - Session endpoints (login, refresh, logout, password change)
//! - Resource services (classes, leave requests) and exports
//! - Configuration loading and the application context
//!
//! ## Architecture
//! - Depends on `kinderhub-domain` for types and `kinderhub-common` for
//!   session storage, progress tracking and tracing setup
//! - Every network seam is a trait (`Transport`, `SessionEndpoints`) so the
//!   pipeline can be driven without a server

pub mod api;
pub mod config;
pub mod context;
pub mod errors;
pub mod http;
pub mod services;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, AuthApi, AuthService, RefreshCoordinator, RefreshOutcome,
    SessionEndpoints,
};
pub use context::AppContext;
pub use errors::InfraError;
pub use http::{HttpError, HttpResponse, ReqwestTransport, RequestSpec, Transport};
pub use services::{ClassService, LeaveRequestService, ServiceError, ServiceResult};
