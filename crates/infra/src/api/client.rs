//! Authenticated API client
//!
//! Every call runs through the same pipeline:
//! 1. the progress indicator is started (and stopped when the attempt ends),
//! 2. the stored access token, if any, is attached as a bearer header,
//! 3. the attempt is bounded by the configured timeout,
//! 4. a 401 on a first attempt joins the single-flight refresh and the
//!    request is replayed once with the new token.

use std::sync::Arc;
use std::time::Duration;

use kinderhub_common::{CredentialStore, NoopProgress, ProgressIndicator};
use kinderhub_domain::{KinderHubError, Result as DomainResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::refresh::{Join, RefreshCoordinator, RefreshGuard, RefreshOutcome};
use super::session::SessionEndpoints;
use crate::http::{
    bearer, FormPart, HttpError, HttpResponse, RequestSpec, ResponseType, RetryableRequest,
    Transport, AUTHORIZATION,
};

/// HTTP client with bearer authentication and single-flight token refresh
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    session: Arc<dyn SessionEndpoints>,
    progress: Arc<dyn ProgressIndicator>,
    refresh: Arc<RefreshCoordinator>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client with its own refresh coordinator.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        session: Arc<dyn SessionEndpoints>,
        progress: Arc<dyn ProgressIndicator>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            session,
            progress,
            refresh: Arc::new(RefreshCoordinator::new()),
            timeout,
        }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Base URL relative paths are joined to
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Per-request timeout, also applied to the refresh call
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a token refresh is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Requests parked behind the in-flight refresh
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.refresh.waiter_count()
    }

    /// Run `spec` through the authenticated pipeline.
    ///
    /// # Errors
    /// Returns the transport error, or the original 401 when the session
    /// could not be refreshed. A replay that fails again is returned as is.
    #[instrument(skip(self, spec), fields(method = %spec.method, url = %spec.url))]
    pub async fn send(&self, spec: RequestSpec) -> Result<HttpResponse, HttpError> {
        let request = RetryableRequest::new(spec);
        match self.attempt(&request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_auth_error() && !request.is_retry => {
                self.recover(request, err).await
            }
            Err(err) => Err(err),
        }
    }

    /// One bounded exchange. Retries get their header from the replay; first
    /// attempts get the stored token.
    async fn attempt(&self, request: &RetryableRequest) -> Result<HttpResponse, HttpError> {
        self.progress.start();
        let _stop = ProgressStop(self.progress.as_ref());

        let mut spec = request.original.clone();
        if !request.is_retry {
            let token = self.credentials.access_token();
            if !token.is_empty() {
                spec.set_header(AUTHORIZATION, bearer(&token));
            }
        }

        debug!(method = %spec.method, url = %spec.url, retry = request.is_retry, "sending request");
        match tokio::time::timeout(self.timeout, self.transport.execute(&spec)).await {
            Ok(result) => result,
            Err(_) => Err(HttpError::Timeout(self.timeout)),
        }
    }

    async fn recover(
        &self,
        request: RetryableRequest,
        error: HttpError,
    ) -> Result<HttpResponse, HttpError> {
        let refresh_token = self.credentials.refresh_token();
        if refresh_token.is_empty() {
            debug!("401 without a refresh token; not refreshing");
            return Err(error);
        }

        match self.refresh.join() {
            Join::Leader(guard) => self.lead_refresh(guard, &refresh_token, request, error).await,
            Join::Waiter(outcome) => match outcome.await {
                Ok(RefreshOutcome::Refreshed(token)) => {
                    self.attempt(&request.into_retry(&token)).await
                }
                Ok(RefreshOutcome::Failed) | Err(_) => Err(error),
            },
        }
    }

    async fn lead_refresh(
        &self,
        guard: RefreshGuard<'_>,
        refresh_token: &str,
        request: RetryableRequest,
        error: HttpError,
    ) -> Result<HttpResponse, HttpError> {
        let refreshed =
            match tokio::time::timeout(self.timeout, self.session.refresh(refresh_token)).await {
                Ok(result) => result,
                Err(_) => Err(HttpError::Timeout(self.timeout)),
            };

        match refreshed {
            Ok(tokens) => {
                let refresh = tokens.refresh.as_deref().unwrap_or(refresh_token);
                self.credentials.store_tokens(&tokens.access, refresh);
                let woken = guard.settle(RefreshOutcome::Refreshed(tokens.access.clone()));
                info!(waiters = woken, rotated = tokens.refresh.is_some(), "access token refreshed");

                self.attempt(&request.into_retry(&tokens.access)).await
            }
            Err(refresh_err) => {
                warn!(error = %refresh_err, "token refresh failed; clearing session");
                let stale = self.credentials.access_token();
                self.credentials.clear();
                let woken = guard.settle(RefreshOutcome::Failed);
                debug!(waiters = woken, "failed pending requests after refresh failure");

                self.logout_best_effort(&stale).await;
                Err(error)
            }
        }
    }

    async fn logout_best_effort(&self, access_token: &str) {
        let token = (!access_token.is_empty()).then_some(access_token);
        match tokio::time::timeout(self.timeout, self.session.logout(token)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "logout after failed refresh did not succeed"),
            Err(_) => warn!(timeout = ?self.timeout, "logout after failed refresh timed out"),
        }
    }

    /// `GET path`, returning the JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get(&self, path: &str) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::get(path)).await?.value())
    }

    /// `GET path?query`, returning the JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get_with_query<K, V>(
        &self,
        path: &str,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Value, HttpError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Ok(self.send(RequestSpec::get(path).query_pairs(query)).await?.value())
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::post(path).json(body)?).await?.value())
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::put(path).json(body)?).await?.value())
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::patch(path).json(body)?).await?.value())
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::delete(path)).await?.value())
    }

    /// `GET path` as a binary download; headers are kept for the filename.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn download(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.send(RequestSpec::get(path).response_type(ResponseType::Binary)).await
    }

    /// `POST path` with a multipart form.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn upload(&self, path: &str, parts: Vec<FormPart>) -> Result<Value, HttpError> {
        Ok(self.send(RequestSpec::post(path).multipart(parts)).await?.value())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url())
            .field("timeout", &self.timeout)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

/// Stops the progress indicator when an attempt ends, including when its
/// future is dropped.
struct ProgressStop<'a>(&'a dyn ProgressIndicator);

impl Drop for ProgressStop<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    session: Option<Arc<dyn SessionEndpoints>>,
    progress: Option<Arc<dyn ProgressIndicator>>,
    refresh: Option<Arc<RefreshCoordinator>>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Transport every request goes through. Required.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where tokens are read and written. Required.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Refresh and logout endpoints. Required.
    #[must_use]
    pub fn session(mut self, session: Arc<dyn SessionEndpoints>) -> Self {
        self.session = Some(session);
        self
    }

    /// Defaults to [`NoopProgress`]
    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Share a refresh coordinator, e.g. between clients of one session
    #[must_use]
    pub fn refresh_coordinator(mut self, refresh: Arc<RefreshCoordinator>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Per-request timeout; defaults to the configured API timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// Returns `KinderHubError::Config` when the transport, credential store
    /// or session endpoints are missing.
    pub fn build(self) -> DomainResult<ApiClient> {
        let missing = |what: &str| KinderHubError::Config(format!("{what} not set"));
        let transport = self.transport.ok_or_else(|| missing("Transport"))?;
        let credentials = self.credentials.ok_or_else(|| missing("Credential store"))?;
        let session = self.session.ok_or_else(|| missing("Session endpoints"))?;

        Ok(ApiClient {
            transport,
            credentials,
            session,
            progress: self.progress.unwrap_or_else(|| Arc::new(NoopProgress)),
            refresh: self.refresh.unwrap_or_default(),
            timeout: self.timeout.unwrap_or(Duration::from_millis(
                kinderhub_domain::constants::DEFAULT_TIMEOUT_MS,
            )),
        })
    }
}
