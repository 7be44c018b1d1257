//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use civicreport_common::auth::{KvTokenStore, TokenManager};
use civicreport_common::storage::{FileKeyValueStore, KeyValueStore};
use civicreport_common::KeychainProvider;
use civicreport_core::{AuthSessionController, RestoreOutcome};
use civicreport_domain::constants::{ACCESS_TOKEN_KEY, KV_STORE_FILE_NAME, REFRESH_TOKEN_KEY};
use civicreport_domain::{CivicError, Config, Result, TokenBackend};
use civicreport_infra::{
    AuthenticatedFetch, CivicApiClient, HttpClient, HttpTokenRefresher, KvProfileCache,
};
use tracing::{debug, info};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub session: AuthSessionController,
    pub api: Arc<CivicApiClient>,
    pub tokens: Arc<TokenManager>,
}

impl AppContext {
    /// Create a new application context from the environment or a config file
    ///
    /// # Errors
    /// Returns `CivicError::Config` when no valid configuration is found.
    pub fn new() -> Result<Self> {
        Self::new_with_config(civicreport_infra::config::load()?)
    }

    /// Create a new application context with custom configuration
    ///
    /// Tests use this to point the client at a mock server and a temporary
    /// data directory. Nothing is read from storage until [`start`].
    ///
    /// [`start`]: Self::start
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new_with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let timeout = Duration::from_secs(config.api.timeout_seconds);
        let max_attempts = usize::try_from(config.api.retry_attempts)
            .map_err(|_| CivicError::Config("retry_attempts out of range".into()))?
            .saturating_add(1);
        let http = HttpClient::builder().timeout(timeout).max_attempts(max_attempts).build()?;

        let file_store: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(config.storage.data_dir.join(KV_STORE_FILE_NAME)));
        let token_kv: Arc<dyn KeyValueStore> = match config.storage.token_backend {
            TokenBackend::File => file_store.clone(),
            TokenBackend::Keychain => {
                Arc::new(KeychainProvider::new(config.storage.keychain_service.clone()))
            }
        };
        debug!(
            backend = %config.storage.token_backend,
            data_dir = %config.storage.data_dir.display(),
            "Token storage selected"
        );

        let refresher = Arc::new(HttpTokenRefresher::new(
            http.clone(),
            &config.api.base_url,
            &config.api.refresh_path,
            timeout,
        ));
        let token_store = Arc::new(KvTokenStore::new(token_kv, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY));
        let tokens = Arc::new(TokenManager::new(refresher, token_store));

        let fetch =
            Arc::new(AuthenticatedFetch::new(http, &config.api.base_url, tokens.clone(), timeout)?);
        let api = Arc::new(CivicApiClient::new(fetch));

        let cache = Arc::new(KvProfileCache::new(file_store));
        let session = AuthSessionController::new(api.clone(), tokens.clone(), cache);

        info!(base_url = %config.api.base_url, "Application context created");
        Ok(Self { config, session, api, tokens })
    }

    /// Restore the persisted session
    pub async fn start(&self) -> RestoreOutcome {
        let outcome = self.session.restore().await;
        info!(?outcome, "Session restore finished");
        outcome
    }

    /// Wait for in-flight session work to finish.
    ///
    /// Idempotent. Nothing else holds resources that need explicit cleanup.
    pub async fn shutdown(&self) {
        info!("shutdown called on AppContext");
        self.session.await_profile_refresh().await;
    }
}
