//! HTTP transport: one request in, one decoded response out

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use kinderhub_domain::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::error::HttpError;
use super::request::{resolve_url, FormPart, RequestBody, RequestSpec};
use super::response::{HttpResponse, ResponseData};

/// Executes one HTTP exchange.
///
/// The authenticated pipeline only sees this trait, so it can be driven by
/// an in-process mock in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `spec` once. Non-2xx responses come back as
    /// [`HttpError::Status`].
    async fn execute(&self, spec: &RequestSpec) -> Result<HttpResponse, HttpError>;

    /// Base URL relative request paths are joined to
    fn base_url(&self) -> &str;
}

/// [`Transport`] backed by a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builder starting from the default API settings.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Build a transport from the API section of the configuration.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidRequest` when the reqwest client cannot be
    /// constructed (for instance an invalid user agent).
    pub fn from_config(config: &ApiConfig) -> Result<Self, HttpError> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .timeout(config.timeout())
            .cookie_store(config.with_credentials);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn prepare(&self, spec: &RequestSpec) -> Result<RequestBuilder, HttpError> {
        let url = resolve_url(&self.base_url, &spec.url);
        let mut builder = self.client.request(spec.method.clone(), url);

        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        for (name, value) in &spec.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &spec.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };
        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, spec: &RequestSpec) -> Result<HttpResponse, HttpError> {
        let method = spec.method.clone();
        let builder = self.prepare(spec)?;
        let timeout = self.timeout;

        let response =
            builder.send().await.map_err(|err| HttpError::from_reqwest(&err, timeout))?;

        let status = response.status();
        let url = response.url().to_string();
        debug!(%method, %url, %status, "received HTTP response");

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| HttpError::from_reqwest(&err, timeout))?
            .to_vec();

        if !status.is_success() {
            return Err(HttpError::status_error(
                status.as_u16(),
                method.as_str(),
                url,
                error_body(&bytes),
            ));
        }

        let data = ResponseData::decode(spec.response_type, bytes)?;
        Ok(HttpResponse { status: status.as_u16(), headers, url, data })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Parsed JSON, else the raw text as a JSON string, else `null`.
fn error_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn build_form(parts: &[FormPart]) -> Result<Form, HttpError> {
    parts.iter().try_fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => Ok(form.text(name.clone(), value.clone())),
        FormPart::File { name, filename, mime, bytes } => {
            let file = Part::bytes(bytes.clone())
                .file_name(filename.clone())
                .mime_str(mime)
                .map_err(|e| HttpError::InvalidRequest(format!("Invalid MIME type '{mime}': {e}")))?;
            Ok(form.part(name.clone(), file))
        }
    })
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    cookie_store: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        let defaults = ApiConfig::default();
        Self {
            base_url: defaults.base_url.clone(),
            timeout: defaults.timeout(),
            user_agent: None,
            cookie_store: false,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Base URL relative paths are joined to.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` header for every request.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Keep cookies between requests
    #[must_use]
    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    /// # Errors
    /// Returns `HttpError::InvalidRequest` when reqwest rejects the settings.
    pub fn build(self) -> Result<ReqwestTransport, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .cookie_store(self.cookie_store)
            .no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| HttpError::InvalidRequest(format!("Failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client, base_url: self.base_url, timeout: self.timeout })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::request::ResponseType;

    fn transport(server: &MockServer) -> ReqwestTransport {
        ReqwestTransport::builder()
            .base_url(format!("{}/api/v1", server.uri()))
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_request_and_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/classes/create"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"className": "Mầm"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 1}})))
            .expect(1)
            .mount(&server)
            .await;

        let spec = RequestSpec::post("/classes/create").json(&json!({"className": "Mầm"})).unwrap();
        let response = transport(&server).execute(&spec).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.value(), json!({"data": {"id": 1}}));
    }

    #[tokio::test]
    async fn test_query_and_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/request-change-password"))
            .and(query_param("lang", "vi"))
            .and(header("content-type", "text/plain"))
            .and(body_string("co.lan@kinder.vn"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let spec = RequestSpec::post("auth/request-change-password")
            .query("lang", "vi")
            .text("co.lan@kinder.vn");
        let response = transport(&server).execute(&spec).await.unwrap();
        assert_eq!(response.value(), Value::Null);
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/classes/find/9"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Không tìm thấy lớp"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/boom"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&server)
            .await;

        let transport = transport(&server);
        let err = transport.execute(&RequestSpec::get("/classes/find/9")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body_field("message"), Some("Không tìm thấy lớp"));

        let err = transport.execute(&RequestSpec::get("/boom")).await.unwrap_err();
        assert!(matches!(err, HttpError::Status { status: 500, body: Value::String(ref s), .. } if s == "Internal error"));
    }

    #[tokio::test]
    async fn test_binary_download_keeps_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/classes/export"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", "attachment; filename=\"lop.xlsx\"")
                    .set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]),
            )
            .mount(&server)
            .await;

        let spec = RequestSpec::get("/classes/export").response_type(ResponseType::Binary);
        let response = transport(&server).execute(&spec).await.unwrap();
        assert_eq!(response.bytes(), vec![0x50, 0x4b, 0x03, 0x04]);
        assert_eq!(response.attachment_filename().as_deref(), Some("lop.xlsx"));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder()
            .base_url(server.uri())
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = transport
            .execute(&RequestSpec::get(format!("{}/api/v1/slow", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(!err.is_auth_error());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::builder()
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = transport.execute(&RequestSpec::get("/x")).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport(_)));
    }
}
