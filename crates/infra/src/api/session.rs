//! Session endpoints: login, refresh, logout and password changes
//!
//! These calls go straight to the transport rather than through the
//! authenticated pipeline. A refresh that itself answered 401 must never
//! trigger another refresh.

use std::sync::Arc;

use async_trait::async_trait;
use kinderhub_domain::TokenPair;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::http::{bearer, HttpError, RequestSpec, Transport, AUTHORIZATION};

/// Tokens returned by a successful refresh
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// New access token
    pub access: String,
    /// Rotated refresh token, if the server issued one
    pub refresh: Option<String>,
}

impl std::fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("access", &"<redacted>")
            .field("rotated", &self.refresh.is_some())
            .finish()
    }
}

/// The two session calls the refresh protocol depends on
#[async_trait]
pub trait SessionEndpoints: Send + Sync {
    /// Exchange a refresh token for a new access token. Any non-success
    /// response is a failure.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, HttpError>;

    /// Best-effort server-side logout.
    async fn logout(&self, access_token: Option<&str>) -> Result<(), HttpError>;
}

/// `/auth/*` endpoints of the REST backend
#[derive(Clone)]
pub struct AuthApi {
    transport: Arc<dyn Transport>,
}

impl AuthApi {
    /// Session calls over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `POST /auth/login`, returning the raw payload.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, HttpError> {
        let spec = RequestSpec::post("/auth/login")
            .json_value(json!({ "username": username, "password": password }));
        let response = self.transport.execute(&spec).await?;
        Ok(response.value())
    }

    /// Ask the backend to mail a password-change code. The email is sent
    /// trimmed, as a `text/plain` body.
    pub async fn request_change_password(&self, email: &str) -> Result<Value, HttpError> {
        let spec = RequestSpec::post("/auth/request-change-password").text(email.trim());
        Ok(self.transport.execute(&spec).await?.value())
    }

    /// `POST /auth/change-password` with the mailed code.
    pub async fn change_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<Value, HttpError> {
        let spec = RequestSpec::post("/auth/change-password").json_value(json!({
            "email": email,
            "code": code,
            "newPassword": new_password,
        }));
        Ok(self.transport.execute(&spec).await?.value())
    }
}

#[async_trait]
impl SessionEndpoints for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, HttpError> {
        let spec = RequestSpec::post("/auth/refresh")
            .json_value(json!({ "refreshToken": refresh_token }));
        let response = self.transport.execute(&spec).await?;

        let tokens = TokenPair::from_payload(&response.value());
        if tokens.access.is_empty() {
            return Err(HttpError::Decode("refresh response carried no access token".into()));
        }

        let rotated = !tokens.refresh.is_empty();
        debug!(rotated, "refresh endpoint issued a new access token");
        Ok(RefreshedTokens {
            access: tokens.access,
            refresh: rotated.then_some(tokens.refresh),
        })
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), HttpError> {
        let mut spec = RequestSpec::get("/auth/logout");
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            spec.set_header(AUTHORIZATION, bearer(token));
        }
        self.transport.execute(&spec).await?;
        info!("server session logged out");
        Ok(())
    }
}

impl std::fmt::Debug for AuthApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApi").field("base_url", &self.transport.base_url()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ReqwestTransport;

    fn auth_api(server: &MockServer) -> AuthApi {
        let transport = ReqwestTransport::builder()
            .base_url(server.uri())
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        AuthApi::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_refresh_reads_rotated_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refreshToken": "R1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"access_token": "A2", "refresh_token": "R2"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = auth_api(&server).refresh("R1").await.unwrap();
        assert_eq!(tokens.access, "A2");
        assert_eq!(tokens.refresh.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_refresh_without_rotation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "A2"})))
            .mount(&server)
            .await;

        let tokens = auth_api(&server).refresh("R1").await.unwrap();
        assert_eq!(tokens.refresh, None);
    }

    #[tokio::test]
    async fn test_refresh_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refreshToken": "expired"})))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refreshToken": "odd"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        assert_eq!(api.refresh("expired").await.unwrap_err().status(), Some(401));
        assert!(matches!(api.refresh("odd").await.unwrap_err(), HttpError::Decode(_)));
    }

    #[tokio::test]
    async fn test_logout_sends_bearer_only_when_known() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        api.logout(Some("A1")).await.unwrap();
        api.logout(None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[1].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_login_and_password_change() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"username": "admin", "password": "secret"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"accessToken": "A1", "refreshToken": "R1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/request-change-password"))
            .and(body_string("co.lan@kinder.vn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "sent"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/change-password"))
            .and(body_json(
                json!({"email": "co.lan@kinder.vn", "code": "123456", "newPassword": "n3w"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "changed"})))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        let payload = api.login("admin", "secret").await.unwrap();
        assert_eq!(payload["accessToken"], "A1");

        let sent = api.request_change_password("  co.lan@kinder.vn ").await.unwrap();
        assert_eq!(sent["message"], "sent");

        let changed = api.change_password("co.lan@kinder.vn", "123456", "n3w").await.unwrap();
        assert_eq!(changed["message"], "changed");
    }

    #[tokio::test]
    async fn test_request_change_password_accepts_plain_text_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/request-change-password"))
            .and(header("content-type", "text/plain"))
            .and(body_string("a@b.vn"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("Code sent to a@b.vn"),
            )
            .mount(&server)
            .await;

        let sent = auth_api(&server).request_change_password(" a@b.vn ").await.unwrap();
        assert_eq!(sent, Value::String("Code sent to a@b.vn".into()));
    }
}
