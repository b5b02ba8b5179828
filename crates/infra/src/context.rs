//! Application context - dependency injection container
//!
//! Wires one session store, one progress indicator and one authenticated
//! [`ApiClient`] (and with it one refresh coordinator) into the services
//! that share them.

use std::sync::Arc;

use kinderhub_common::observability::init_tracing;
use kinderhub_common::{KeyValueStore, LoadingBar, TokenStore};
use kinderhub_domain::{Config, KinderHubError, Result};
use tracing::info;

use crate::api::{ApiClient, AuthApi, AuthService};
use crate::config::{build_storage, load};
use crate::http::{ReqwestTransport, Transport};
use crate::services::{ClassService, LeaveRequestService};

/// Application context - holds all services and dependencies
pub struct AppContext {
    /// Loaded configuration
    pub config: Config,
    /// Persisted session
    pub store: Arc<TokenStore>,
    /// Global loading bar
    pub progress: Arc<LoadingBar>,
    /// Authenticated API client
    pub client: Arc<ApiClient>,
    /// Login, logout and profile
    pub auth: AuthService,
    /// Class management
    pub classes: ClassService,
    /// Leave request decisions
    pub leave_requests: LeaveRequestService,
}

impl AppContext {
    /// Load configuration, install the tracing subscriber and build the
    /// context.
    ///
    /// # Errors
    /// Returns the configuration, storage or transport error that stopped
    /// initialisation.
    pub fn from_env() -> Result<Self> {
        let config = load()?;
        init_tracing(&config.logging.level, config.logging.json);
        Self::new(config)
    }

    /// Build the context over the storage backend named in `config`.
    ///
    /// # Errors
    /// Returns `KinderHubError::Config` for an invalid API section and
    /// `KinderHubError::Storage` when the session backend cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = build_storage(&config.storage)?;
        let transport = ReqwestTransport::from_config(&config.api)
            .map_err(|e| KinderHubError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_parts(config, storage, Arc::new(transport))
    }

    /// Build the context over explicit storage and transport.
    ///
    /// # Errors
    /// Returns `KinderHubError::Config` if the client cannot be assembled.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let store = Arc::new(TokenStore::load(storage));
        let progress = Arc::new(LoadingBar::new());
        let auth_api = AuthApi::new(Arc::clone(&transport));

        let client = Arc::new(
            ApiClient::builder()
                .transport(transport)
                .credentials(store.clone())
                .session(Arc::new(auth_api.clone()))
                .progress(progress.clone())
                .timeout(config.api.timeout())
                .build()?,
        );

        info!(
            base_url = client.base_url(),
            authenticated = store.is_authenticated(),
            "application context ready"
        );

        Ok(Self {
            auth: AuthService::new(Arc::clone(&client), auth_api, Arc::clone(&store)),
            classes: ClassService::new(Arc::clone(&client)),
            leave_requests: LeaveRequestService::new(Arc::clone(&client)),
            config,
            store,
            progress,
            client,
        })
    }
}
