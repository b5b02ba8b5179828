//! Mock transport and session endpoints

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{RefreshedTokens, SessionEndpoints};
use crate::http::{bearer, HttpError, HttpResponse, RequestSpec, Transport, AUTHORIZATION};

type Responder = dyn Fn(&RequestSpec) -> Result<HttpResponse, HttpError> + Send + Sync;

/// Transport answering from a closure and logging every request it sees
///
/// Clones share the responder and the request log.
///
/// # Examples
///
/// ```ignore
/// use kinderhub_infra::http::{RequestSpec, Transport};
/// use kinderhub_infra::testing::MockTransport;
///
/// # async fn demo() {
/// let transport = MockTransport::auth_gate("A2");
/// let denied = transport.execute(&RequestSpec::get("/classes/all")).await;
/// assert_eq!(denied.unwrap_err().status(), Some(401));
///
/// let allowed = RequestSpec::get("/classes/all").header("Authorization", "Bearer A2");
/// assert!(transport.execute(&allowed).await.is_ok());
/// assert_eq!(transport.request_count(), 2);
/// # }
/// ```
#[derive(Clone)]
pub struct MockTransport {
    base_url: String,
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<RequestSpec>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Transport answering every request with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RequestSpec) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    {
        Self {
            base_url: "http://mock.local/api/v1".to_string(),
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Answers 401 unless the request carries `Bearer <valid_token>`; then
    /// 200 with `{"path": <url>}`.
    #[must_use]
    pub fn auth_gate(valid_token: &str) -> Self {
        let expected = bearer(valid_token);
        Self::new(move |spec| {
            if spec.header_value(AUTHORIZATION) == Some(expected.as_str()) {
                Ok(HttpResponse::json(200, &spec.url, json!({ "path": spec.url })))
            } else {
                Err(unauthorized(spec))
            }
        })
    }

    /// Base URL reported by [`Transport::base_url`].
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sleep before answering each request
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests whose URL equals `url`
    pub fn requests_to(&self, url: &str) -> Vec<RequestSpec> {
        self.requests.lock().iter().filter(|spec| spec.url == url).cloned().collect()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("base_url", &self.base_url)
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, spec: &RequestSpec) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(spec.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(spec)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// 401 for `spec`, the way the backend reports an expired token
pub fn unauthorized(spec: &RequestSpec) -> HttpError {
    HttpError::status_error(
        401,
        spec.method.as_str(),
        spec.url.clone(),
        json!({ "message": "Unauthorized" }),
    )
}

/// Scriptable [`SessionEndpoints`]
///
/// Counts calls, records the tokens it was given, and can hold a refresh in
/// flight until [`release_refresh`](Self::release_refresh) is called.
#[derive(Debug)]
pub struct MockSessionEndpoints {
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    outcome: Mutex<Result<RefreshedTokens, HttpError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    refresh_tokens: Mutex<Vec<String>>,
    logout_tokens: Mutex<Vec<Option<String>>>,
    fail_logout: AtomicBool,
}

impl Default for MockSessionEndpoints {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            outcome: Mutex::new(Ok(RefreshedTokens { access: "A2".into(), refresh: None })),
            gate: Mutex::new(None),
            refresh_tokens: Mutex::new(Vec::new()),
            logout_tokens: Mutex::new(Vec::new()),
            fail_logout: AtomicBool::new(false),
        }
    }
}

impl MockSessionEndpoints {
    /// Refreshes succeed with access token `A2` and no rotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`new`](Self::new) behind an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make refreshes succeed with these tokens.
    pub fn succeed_with(&self, access: &str, refresh: Option<&str>) {
        *self.outcome.lock() = Ok(RefreshedTokens {
            access: access.to_string(),
            refresh: refresh.map(str::to_string),
        });
    }

    /// Make refreshes fail with `error`.
    pub fn fail_with(&self, error: HttpError) {
        *self.outcome.lock() = Err(error);
    }

    /// Make the next refresh wait until [`release_refresh`](Self::release_refresh).
    pub fn hold_refresh(&self) {
        *self.gate.lock() = Some(Arc::new(Notify::new()));
    }

    /// Let a held refresh complete. Safe to call before the refresh starts
    /// waiting.
    pub fn release_refresh(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.notify_one();
        }
    }

    /// Make logout calls fail.
    pub fn fail_logout(&self, fail: bool) {
        self.fail_logout.store(fail, Ordering::SeqCst);
    }

    /// Refresh calls made so far
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Logout calls made so far
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented, in call order
    pub fn refresh_tokens(&self) -> Vec<String> {
        self.refresh_tokens.lock().clone()
    }

    /// Access tokens presented to logout, in call order
    pub fn logout_tokens(&self) -> Vec<Option<String>> {
        self.logout_tokens.lock().clone()
    }
}

#[async_trait]
impl SessionEndpoints for MockSessionEndpoints {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, HttpError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens.lock().push(refresh_token.to_string());

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.outcome.lock().clone()
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), HttpError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logout_tokens.lock().push(access_token.map(str::to_string));

        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(HttpError::Transport("connection reset".into()));
        }
        Ok(())
    }
}

/// JSON body helper for responders
pub fn ok_json(spec: &RequestSpec, body: Value) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::json(200, spec.url.clone(), body))
}
