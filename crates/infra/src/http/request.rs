//! Request description passed through the pipeline
//!
//! A [`RequestSpec`] captures everything needed to issue (and later
//! re-issue) a call: method, URL, headers, query, body and how to decode the
//! response. It is plain data, so replaying a request after a token refresh
//! is a clone plus one header change.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::HttpError;

/// Header carrying the bearer token
pub const AUTHORIZATION: &str = "Authorization";
/// Header naming the body's media type
pub const CONTENT_TYPE: &str = "Content-Type";

/// How the response body should be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Parsed as JSON; an empty body becomes `null`
    #[default]
    Json,
    /// UTF-8 text
    Text,
    /// Raw bytes (file downloads)
    Binary,
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// Uploaded file
    File {
        /// Field name
        name: String,
        /// File name sent to the server
        filename: String,
        /// MIME type of `bytes`
        mime: String,
        /// File contents
        bytes: Vec<u8>,
    },
}

impl FormPart {
    /// Text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text { name: name.into(), value: value.into() }
    }

    /// File field with its MIME type.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::File { name: name.into(), filename: filename.into(), mime: mime.into(), bytes }
    }
}

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON body
    Json(Value),
    /// `text/plain` body
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// `multipart/form-data` body
    Multipart(Vec<FormPart>),
}

/// Method, URL, headers, query, body and response type of one call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, or a path joined to the transport's base URL
    pub url: String,
    /// Headers in insertion order; names are unique ignoring case
    pub headers: Vec<(String, String)>,
    /// Query pairs appended to the URL
    pub query: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
    /// How to decode the response
    pub response_type: ResponseType,
}

impl RequestSpec {
    /// Request with no headers, query or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            response_type: ResponseType::Json,
        }
    }

    /// `GET url`
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// `POST url`
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// `PUT url`
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// `PATCH url`
    #[must_use]
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// `DELETE url`
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append one query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters, keeping their order.
    #[must_use]
    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a header, replacing any existing one of the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place form of [`header`](Self::header).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Header value, case-insensitive on the name
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// JSON body from an already-built value.
    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// JSON body from any serialisable value.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidRequest` when `body` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body)
            .map_err(|e| HttpError::InvalidRequest(format!("Failed to serialize body: {e}")))?;
        Ok(self.json_value(value))
    }

    /// Plain-text body sent as `text/plain`.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self.header(CONTENT_TYPE, "text/plain")
    }

    /// Raw byte body.
    #[must_use]
    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes(body);
        self
    }

    /// Multipart form body.
    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// How the response body should be decoded.
    #[must_use]
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// A request plus whether it is already the replay after a refresh
///
/// A replay that fails with 401 is terminal; it never starts a second
/// refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryableRequest {
    /// Request as first issued
    pub original: RequestSpec,
    /// Whether this is the replay after a refresh
    pub is_retry: bool,
}

impl RetryableRequest {
    /// First attempt of `original`.
    #[must_use]
    pub fn new(original: RequestSpec) -> Self {
        Self { original, is_retry: false }
    }

    /// The replay: the original request verbatim except for the
    /// `Authorization` header, flagged as a retry.
    #[must_use]
    pub fn into_retry(self, access_token: &str) -> Self {
        let mut original = self.original;
        original.set_header(AUTHORIZATION, bearer(access_token));
        Self { original, is_retry: true }
    }
}

/// `Bearer <token>`
#[must_use]
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Join `path` onto `base_url` with exactly one `/` between them. Absolute
/// `http(s)://` URLs are returned unchanged.
#[must_use]
pub fn resolve_url(base_url: &str, path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let spec = RequestSpec::patch("/leave-requests/teachers/5/approve")
            .query("teacherName", "Cô Lan")
            .json(&json!({"teacherNote": "ok"}))
            .unwrap();

        assert_eq!(spec.method, Method::PATCH);
        assert_eq!(spec.query, vec![("teacherName".into(), "Cô Lan".into())]);
        assert_eq!(spec.body, RequestBody::Json(json!({"teacherNote": "ok"})));
        assert_eq!(spec.response_type, ResponseType::Json);
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let spec = RequestSpec::get("/x").header("authorization", "Bearer A1").header(
            AUTHORIZATION,
            "Bearer A2",
        );
        assert_eq!(spec.headers.len(), 1);
        assert_eq!(spec.header_value("AUTHORIZATION"), Some("Bearer A2"));
    }

    #[test]
    fn test_text_body_sets_content_type() {
        let spec = RequestSpec::post("/auth/request-change-password").text("a@b.vn");
        assert_eq!(spec.header_value("content-type"), Some("text/plain"));
        assert_eq!(spec.body, RequestBody::Text("a@b.vn".into()));
    }

    #[test]
    fn test_retry_changes_only_authorization() {
        let original = RequestSpec::put("/classes/update/3")
            .header("X-Trace", "t-1")
            .query("force", "true")
            .json(&json!({"className": "Koala"}))
            .unwrap()
            .response_type(ResponseType::Json);
        let request = RetryableRequest::new(original.clone());
        assert!(!request.is_retry);

        let replay = request.into_retry("A2");
        assert!(replay.is_retry);
        assert_eq!(replay.original.header_value(AUTHORIZATION), Some("Bearer A2"));

        let mut expected = original;
        expected.set_header(AUTHORIZATION, "Bearer A2");
        assert_eq!(replay.original, expected);
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url("http://h/api/v1", "/classes/all"), "http://h/api/v1/classes/all");
        assert_eq!(resolve_url("http://h/api/v1/", "/classes/all"), "http://h/api/v1/classes/all");
        assert_eq!(resolve_url("http://h/api/v1", "classes/all"), "http://h/api/v1/classes/all");
        assert_eq!(resolve_url("http://h/api/v1", "https://cdn/x.png"), "https://cdn/x.png");
        assert_eq!(resolve_url("http://h/api/v1", ""), "http://h/api/v1");
    }
}
