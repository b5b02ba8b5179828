//! Error conversions from infrastructure crates into [`KinderHubError`]
//!
//! [`KinderHubError`]: kinderhub_domain::KinderHubError

mod conversions;

pub use conversions::InfraError;
