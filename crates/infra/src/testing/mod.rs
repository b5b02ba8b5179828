//! In-process doubles for the HTTP seams
//!
//! Enabled for downstream crates through the `test-utils` feature.

pub mod mocks;

pub use mocks::{ok_json, unauthorized, MockSessionEndpoints, MockTransport};
