//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use kinderhub_common::StorageError;
use kinderhub_domain::KinderHubError;

use crate::http::HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KinderHubError);

impl From<InfraError> for KinderHubError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KinderHubError> for InfraError {
    fn from(value: KinderHubError) -> Self {
        InfraError(value)
    }
}

trait IntoKinderHubError {
    fn into_kinderhub(self) -> KinderHubError;
}

/* -------------------------------------------------------------------------- */
/* HttpError → KinderHubError */
/* -------------------------------------------------------------------------- */

impl IntoKinderHubError for HttpError {
    fn into_kinderhub(self) -> KinderHubError {
        let description = self.to_string();
        match self {
            HttpError::Timeout(_) | HttpError::Transport(_) => KinderHubError::Network(description),
            HttpError::Status { status, .. } => match status {
                401 | 403 => KinderHubError::Auth(description),
                404 => KinderHubError::NotFound(description),
                429 | 500..=599 => KinderHubError::Network(description),
                _ => KinderHubError::InvalidInput(description),
            },
            HttpError::Decode(_) => KinderHubError::Internal(description),
            HttpError::InvalidRequest(_) => KinderHubError::InvalidInput(description),
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_kinderhub())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KinderHubError */
/* -------------------------------------------------------------------------- */

impl IntoKinderHubError for reqwest::Error {
    fn into_kinderhub(self) -> KinderHubError {
        if self.is_timeout() {
            return KinderHubError::Network("HTTP request timed out".into());
        }
        if self.is_connect() {
            return KinderHubError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => KinderHubError::Auth(message),
                404 => KinderHubError::NotFound(message),
                400..=499 if code != 429 => KinderHubError::InvalidInput(message),
                _ => KinderHubError::Network(message),
            };
        }

        if self.is_builder() {
            return KinderHubError::Config(self.to_string());
        }
        KinderHubError::Network(self.to_string())
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        InfraError(value.into_kinderhub())
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → KinderHubError */
/* -------------------------------------------------------------------------- */

impl IntoKinderHubError for KeyringError {
    fn into_kinderhub(self) -> KinderHubError {
        let description = self.to_string();

        match self {
            KeyringError::NoEntry => KinderHubError::NotFound("keychain entry not found".into()),
            KeyringError::BadEncoding(_) => {
                KinderHubError::Storage("credential in keychain is not valid UTF-8".into())
            }
            KeyringError::NoStorageAccess(err) => {
                KinderHubError::Storage(format!("unable to access secure storage: {err}"))
            }
            KeyringError::PlatformFailure(err) => {
                KinderHubError::Storage(format!("keychain platform error: {err}"))
            }
            _ => KinderHubError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_kinderhub())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / io / storage → KinderHubError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(KinderHubError::InvalidInput(format!("invalid JSON: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        let error = match value.kind() {
            std::io::ErrorKind::NotFound => KinderHubError::NotFound(value.to_string()),
            _ => KinderHubError::Storage(value.to_string()),
        };
        InfraError(error)
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        let error = match value {
            StorageError::InvalidConfig(reason) => KinderHubError::Config(reason),
            other => KinderHubError::Storage(other.to_string()),
        };
        InfraError(error)
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::{Client, StatusCode};
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn status(code: u16) -> HttpError {
        HttpError::Status {
            status: code,
            method: "GET".into(),
            url: "http://mock.local/api/v1/classes/all".into(),
            body: json!({ "message": "nope" }),
        }
    }

    #[test]
    fn pipeline_errors_map_by_status() {
        let auth: KinderHubError = InfraError::from(status(401)).into();
        assert!(matches!(auth, KinderHubError::Auth(_)));

        let missing: KinderHubError = InfraError::from(status(404)).into();
        assert!(matches!(missing, KinderHubError::NotFound(_)));

        let invalid: KinderHubError = InfraError::from(status(422)).into();
        assert!(matches!(invalid, KinderHubError::InvalidInput(_)));

        let server: KinderHubError = InfraError::from(status(503)).into();
        assert!(matches!(server, KinderHubError::Network(_)));

        let timeout: KinderHubError =
            InfraError::from(HttpError::Timeout(Duration::from_secs(15))).into();
        assert!(matches!(timeout, KinderHubError::Network(_)));
    }

    #[test]
    fn keyring_no_entry_maps_to_not_found() {
        let mapped: KinderHubError = InfraError::from(KeyringError::NoEntry).into();
        match mapped {
            KinderHubError::NotFound(msg) => assert!(msg.contains("keychain")),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn storage_and_io_errors_map_to_storage() {
        let corrupt = StorageError::Corrupt { path: "session.json".into(), reason: "eof".into() };
        let mapped: KinderHubError = InfraError::from(corrupt).into();
        assert!(matches!(mapped, KinderHubError::Storage(msg) if msg.contains("session.json")));

        let config: KinderHubError =
            InfraError::from(StorageError::InvalidConfig("no path".into())).into();
        assert_eq!(config, KinderHubError::Config("no path".into()));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let mapped: KinderHubError = InfraError::from(denied).into();
        assert!(matches!(mapped, KinderHubError::Storage(_)));
    }

    #[tokio::test]
    async fn reqwest_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: KinderHubError = InfraError::from(error).into();
        match mapped {
            KinderHubError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
