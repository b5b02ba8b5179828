//! Session orchestration on top of the token store
//!
//! `AuthService` is the only writer of the profile and role. Tokens are
//! also written by the [`ApiClient`] when it refreshes them.

use std::sync::Arc;

use kinderhub_common::auth::jwt;
use kinderhub_common::TokenStore;
use kinderhub_domain::{role_from_payload, TokenPair, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::session::{AuthApi, SessionEndpoints};
use crate::http::HttpError;
use crate::services::support::{unwrap_data, with_api_v1};

/// Editable profile fields for `PUT /accounts/me`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// New email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Login, logout and profile operations for the signed-in account
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
    auth_api: AuthApi,
    store: Arc<TokenStore>,
}

impl AuthService {
    /// Service over the shared client, session calls and store.
    pub fn new(client: Arc<ApiClient>, auth_api: AuthApi, store: Arc<TokenStore>) -> Self {
        Self { client, auth_api, store }
    }

    /// Sign in and persist tokens, role and profile.
    ///
    /// # Errors
    /// Returns the HTTP error of the login call; nothing is stored then.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, HttpError> {
        let payload = self.auth_api.login(username, password).await?;

        // Some deployments wrap the account in an envelope.
        let account = match payload.get("data") {
            Some(data) if data.is_object() && payload.get("username").is_none() => data,
            _ => &payload,
        };

        let tokens = TokenPair::from_payload(&payload);
        let role = role_from_payload(account);
        self.store.set_tokens(&tokens.access, &tokens.refresh);
        self.store.set_role(&role);
        self.store.set_user(Some(&UserProfile::from_login_payload(account, &role)));

        info!(role = %role, "signed in");
        Ok(payload)
    }

    /// Tell the server, then forget the session whatever it answered.
    pub async fn logout(&self) {
        let token = self.store.access_token();
        let token = (!token.is_empty()).then_some(token.as_str());
        if let Err(err) = self.auth_api.logout(token).await {
            warn!(error = %err, "logout request failed");
        }
        self.store.clear();
        info!("signed out");
    }

    /// # Errors
    /// Returns the HTTP error of the request.
    pub async fn request_change_password(&self, email: &str) -> Result<Value, HttpError> {
        self.auth_api.request_change_password(email).await
    }

    /// # Errors
    /// Returns the HTTP error of the request.
    pub async fn change_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<Value, HttpError> {
        self.auth_api.change_password(email, code, new_password).await
    }

    /// Update the basic profile and merge the result into the stored one.
    /// Fields the server leaves out keep the submitted values.
    ///
    /// # Errors
    /// Returns the HTTP error of the update; the stored profile is unchanged.
    pub async fn update_profile_basic(&self, update: &ProfileUpdate) -> Result<Value, HttpError> {
        let body = self.client.put_json("/accounts/me", update).await?;
        let saved = unwrap_data(body);

        let text = |key: &str| saved.get(key).and_then(Value::as_str).map(str::to_string);
        let avatar = text("avatarUrl").filter(|s| !s.is_empty()).or_else(|| text("avatar"));
        let fields = [
            ("fullName", text("fullName").or_else(|| update.full_name.clone())),
            ("email", text("email").or_else(|| update.email.clone())),
            ("phone", text("phone").or_else(|| update.phone.clone())),
            ("avatar", avatar.filter(|s| !s.is_empty()).or_else(|| update.avatar.clone())),
        ];

        let mut merged = match self.store.user() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in fields {
            if let Some(value) = value {
                merged.insert(key.to_string(), Value::String(value));
            }
        }

        let merged = Value::Object(merged);
        self.store.set_user_value(Some(merged.clone()));
        debug!("profile updated");
        Ok(merged)
    }

    /// Login name of the current account, from the stored profile or else
    /// the access token's claims.
    #[must_use]
    pub fn current_username(&self) -> Option<String> {
        if let Some(name) = self.store.user().as_ref().and_then(username_from_user) {
            return Some(name);
        }
        jwt::decode_claims(&self.store.access_token())
            .as_ref()
            .and_then(jwt::username_from_claims)
    }

    /// Login name as reported by `GET /auth/me`. Any failure yields `None`.
    pub async fn fetch_current_username(&self) -> Option<String> {
        let path = with_api_v1(self.client.base_url(), "/auth/me");
        match self.client.get(&path).await {
            Ok(body) => username_from_user(&unwrap_data(body)),
            Err(err) => {
                debug!(error = %err, "could not fetch current user");
                None
            }
        }
    }

    /// Whether the store holds an access token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Stored profile JSON
    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.store.user()
    }

    /// Stored role
    #[must_use]
    pub fn role(&self) -> String {
        self.store.role()
    }
}

/// Best guess at a login name across the account shapes the backend uses.
#[must_use]
pub fn username_from_user(user: &Value) -> Option<String> {
    let direct = [
        user.get("username"),
        user.pointer("/user/username"),
        user.pointer("/account/username"),
        user.get("login"),
        user.get("code"),
        user.get("full_name"),
        user.get("fullName"),
        user.get("name"),
    ];
    direct
        .into_iter()
        .flatten()
        .find_map(as_text)
        .or_else(|| {
            user.get("email")
                .and_then(as_text)
                .and_then(|email| email.split('@').next().map(str::to_string))
                .filter(|local| !local.is_empty())
        })
        .or_else(|| user.get("phone").and_then(as_text))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
