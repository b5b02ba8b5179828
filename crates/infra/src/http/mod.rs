//! HTTP request model, transport and error taxonomy

pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use error::{ErrorCategory, HttpError};
pub use request::{
    bearer, resolve_url, FormPart, RequestBody, RequestSpec, ResponseType, RetryableRequest,
    AUTHORIZATION,
};
pub use response::{HttpResponse, ResponseData};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder, Transport};
