//! Resource services
//!
//! Each service builds URLs under `/api/v1`, calls the authenticated
//! [`ApiClient`](crate::api::ApiClient), unwraps the `{status, message,
//! data}` envelope and turns failures into a [`ServiceError`] carrying the
//! message to show the user.

pub mod classes;
pub mod errors;
pub mod export;
pub mod leave_requests;
pub mod query;
pub mod support;

pub use classes::{ClassFilter, ClassService};
pub use errors::{ServiceError, ServiceResult};
pub use export::{csv_cell, csv_document, Download};
pub use leave_requests::LeaveRequestService;
pub use query::{apply_query, ListQuery, Listable, SortSpec};
