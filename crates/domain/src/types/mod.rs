//! Common data types used throughout the client

pub mod envelope;
pub mod paging;
pub mod school;
pub mod session;

pub use envelope::ApiEnvelope;
pub use paging::Page;
pub use school::{
    ClassOption, ClassPayload, ClassRecord, LeaveRequest, LeaveStatus, NO_TEACHER_LABEL,
};
pub use session::{normalize_role, role_from_payload, Credentials, TokenPair, UserProfile};
