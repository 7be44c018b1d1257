//! Token manager with serialized rotation
//!
//! Owns the in-memory token pair and keeps it in step with the token store:
//! - Token retrieval from storage at start-up
//! - Rotation through a [`TokenRefresher`] when the server rejects a token
//! - A generation counter so a rotation finishing after logout (or after a
//!   new login) is dropped instead of resurrecting old credentials

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::traits::{RefreshError, TokenRefresher, TokenStore};
use super::types::TokenPair;
use crate::storage::StorageError;

/// Error type for token manager operations
#[derive(Debug, Error)]
pub enum TokenManagerError {
    /// Token store operation failed
    #[error("Token store error: {0}")]
    Store(#[from] StorageError),

    /// No tokens available (not authenticated)
    #[error("Not authenticated (no tokens)")]
    NotAuthenticated,

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Tokens were replaced or cleared while the refresh was in flight
    #[error("Token rotation superseded by a newer session change")]
    Superseded,
}

impl TokenManagerError {
    /// The current credentials can never be rotated again: the server
    /// refused the refresh token, or there is none to send.
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        match self {
            Self::NoRefreshToken => true,
            Self::RefreshFailed(err) => err.is_refusal(),
            Self::Store(_) | Self::NotAuthenticated | Self::Superseded => false,
        }
    }
}

#[derive(Default)]
struct TokenState {
    pair: Option<TokenPair>,
    generation: u64,
}

/// Token manager
///
/// Thread-safe: share it behind an `Arc`. Writes to the store happen while
/// the state lock is held, so memory and storage never disagree about which
/// pair is current.
pub struct TokenManager {
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn TokenStore>,
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Create a new token manager. Call [`initialize`](Self::initialize)
    /// before use to pick up persisted tokens.
    #[must_use]
    pub fn new(refresher: Arc<dyn TokenRefresher>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            refresher,
            store,
            state: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Load persisted tokens into memory.
    ///
    /// # Errors
    /// Returns error if the store cannot be read (not if tokens don't exist)
    pub async fn initialize(&self) -> Result<Option<TokenPair>, TokenManagerError> {
        let mut state = self.state.write().await;
        let loaded = self.store.load().await?;
        match &loaded {
            Some(_) => info!("Token manager initialized with existing tokens"),
            None => debug!("No existing tokens found in storage"),
        }
        state.pair.clone_from(&loaded);
        Ok(loaded)
    }

    /// Replace the current tokens (after login) and persist them.
    ///
    /// Starts a new generation: rotations started before this call are
    /// discarded when they complete.
    ///
    /// # Errors
    /// Returns error if the store write fails; memory is left unchanged.
    pub async fn store_tokens(&self, tokens: TokenPair) -> Result<u64, TokenManagerError> {
        let mut state = self.state.write().await;
        self.store.save(&tokens).await?;
        state.pair = Some(tokens);
        state.generation += 1;
        info!(generation = state.generation, "Tokens stored");
        Ok(state.generation)
    }

    /// Current access token, if authenticated
    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.pair.as_ref().map(|p| p.access_token.clone())
    }

    /// Current token pair, if authenticated
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.state.read().await.pair.clone()
    }

    /// Check if user is authenticated (has tokens)
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.pair.is_some()
    }

    /// Generation of the current token pair
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Rotate the access token using the refresh token.
    ///
    /// `rejected_access_token` is the token the server just refused. Refreshes
    /// are serialized; if another caller already rotated past that token, its
    /// result is returned without spending the refresh token again. Pass
    /// `None` to force a rotation.
    ///
    /// On success the new pair is persisted before it is returned. A refresh
    /// response without a refresh token keeps the current one.
    ///
    /// # Errors
    /// - `NotAuthenticated` / `NoRefreshToken` when there is nothing to rotate
    /// - `RefreshFailed` when the refresh endpoint did not issue a token
    /// - `Superseded` when tokens were replaced or cleared meanwhile
    /// - `Store` when persisting the rotated pair fails
    pub async fn refresh_tokens(
        &self,
        rejected_access_token: Option<&str>,
    ) -> Result<String, TokenManagerError> {
        let _refresh_guard = self.refresh_lock.lock().await;

        let (current, generation) = {
            let state = self.state.read().await;
            let pair = state.pair.clone().ok_or(TokenManagerError::NotAuthenticated)?;
            (pair, state.generation)
        };

        if let Some(rejected) = rejected_access_token {
            if current.access_token != rejected {
                debug!("Access token already rotated by a concurrent refresh");
                return Ok(current.access_token);
            }
        }

        let refresh_token =
            current.refresh_token.clone().ok_or(TokenManagerError::NoRefreshToken)?;

        let refreshed = match self.refresher.refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(error = %err, "Token refresh failed");
                return Err(err.into());
            }
        };

        let mut state = self.state.write().await;
        if state.generation != generation || state.pair.is_none() {
            warn!(
                started_generation = generation,
                current_generation = state.generation,
                "Discarding token rotation that completed after a session change"
            );
            return Err(TokenManagerError::Superseded);
        }

        let rotated = current.rotated(refreshed);
        self.store.save(&rotated).await?;
        let access_token = rotated.access_token.clone();
        state.pair = Some(rotated);

        info!(generation = state.generation, "Successfully refreshed access token");
        Ok(access_token)
    }

    /// Clear all tokens (logout).
    ///
    /// Memory is cleared and the generation advanced even when the store
    /// fails, so the session cannot keep using the old pair.
    ///
    /// # Errors
    /// Returns error if the store could not be cleared
    pub async fn clear_tokens(&self) -> Result<(), TokenManagerError> {
        let mut state = self.state.write().await;
        state.pair = None;
        state.generation += 1;
        let result = self.store.clear().await;
        info!(generation = state.generation, "Tokens cleared (logged out)");
        result.map_err(TokenManagerError::from)
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::store::KvTokenStore;
    use crate::auth::types::RefreshedTokens;
    use crate::testing::{MockKeychainProvider, MockTokenRefresher};

    struct Harness {
        manager: Arc<TokenManager>,
        refresher: Arc<MockTokenRefresher>,
        kv: Arc<MockKeychainProvider>,
    }

    fn harness() -> Harness {
        let kv = Arc::new(MockKeychainProvider::new("civic-test"));
        let store = Arc::new(KvTokenStore::new(kv.clone(), "accessToken", "refreshToken"));
        let refresher = Arc::new(MockTokenRefresher::new());
        let manager = Arc::new(TokenManager::new(refresher.clone(), store));
        Harness { manager, refresher, kv }
    }

    fn rotated(access: &str, refresh: Option<&str>) -> RefreshedTokens {
        RefreshedTokens {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_initialize_without_tokens() {
        let h = harness();
        assert!(h.manager.initialize().await.unwrap().is_none());
        assert!(!h.manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_initialize_picks_up_persisted_tokens() {
        let h = harness();
        h.kv.set_secret("accessToken", "a0");
        h.kv.set_secret("refreshToken", "r0");

        let loaded = h.manager.initialize().await.unwrap();
        assert_eq!(loaded, Some(TokenPair::new("a0", Some("r0".into()))));
        assert_eq!(h.manager.access_token().await.as_deref(), Some("a0"));
    }

    #[tokio::test]
    async fn test_store_and_clear_tokens() {
        let h = harness();
        let generation = h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        assert_eq!(generation, 1);
        assert!(h.manager.is_authenticated().await);
        assert_eq!(h.kv.get_secret("accessToken").as_deref(), Some("a1"));

        h.manager.clear_tokens().await.unwrap();
        assert!(!h.manager.is_authenticated().await);
        assert!(h.kv.is_empty());
        assert_eq!(h.manager.generation().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_persists_rotated_pair() {
        let h = harness();
        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.refresher.push_ok(rotated("a2", Some("r2")));

        let token = h.manager.refresh_tokens(Some("a1")).await.unwrap();
        assert_eq!(token, "a2");
        assert_eq!(h.refresher.seen_refresh_tokens(), vec!["r1".to_string()]);
        assert_eq!(h.kv.get_secret("accessToken").as_deref(), Some("a2"));
        assert_eq!(h.kv.get_secret("refreshToken").as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let h = harness();
        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.refresher.push_ok(rotated("a2", None));

        h.manager.refresh_tokens(None).await.unwrap();
        assert_eq!(h.manager.tokens().await, Some(TokenPair::new("a2", Some("r1".into()))));
    }

    #[tokio::test]
    async fn test_refresh_errors() {
        let h = harness();
        let result = h.manager.refresh_tokens(None).await;
        assert!(matches!(result, Err(TokenManagerError::NotAuthenticated)));

        h.manager.store_tokens(TokenPair::new("a1", None)).await.unwrap();
        let result = h.manager.refresh_tokens(Some("a1")).await;
        assert!(matches!(result, Err(TokenManagerError::NoRefreshToken)));

        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.refresher.push_err(RefreshError::Rejected { status: 401 });
        let result = h.manager.refresh_tokens(Some("a1")).await;
        assert!(matches!(result, Err(TokenManagerError::RefreshFailed(_))));
        assert!(result.unwrap_err().is_refusal());
        assert_eq!(h.manager.access_token().await.as_deref(), Some("a1"));

        h.refresher.push_err(RefreshError::Rejected { status: 503 });
        let err = h.manager.refresh_tokens(Some("a1")).await.unwrap_err();
        assert!(!err.is_refusal());
        assert_eq!(h.manager.access_token().await.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_spend_refresh_token_once() {
        let h = harness();
        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.refresher.set_delay(Duration::from_millis(50));
        h.refresher.push_ok(rotated("a2", Some("r2")));

        let (first, second) = tokio::join!(
            h.manager.refresh_tokens(Some("a1")),
            h.manager.refresh_tokens(Some("a1"))
        );
        assert_eq!(first.unwrap(), "a2");
        assert_eq!(second.unwrap(), "a2");
        assert_eq!(h.refresher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rotation_after_logout_is_not_persisted() {
        let h = harness();
        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.refresher.set_delay(Duration::from_millis(100));
        h.refresher.push_ok(rotated("a2", Some("r2")));

        let manager = h.manager.clone();
        let refresh = tokio::spawn(async move { manager.refresh_tokens(Some("a1")).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        h.manager.clear_tokens().await.unwrap();

        let result = refresh.await.unwrap();
        assert!(matches!(result, Err(TokenManagerError::Superseded)));
        assert!(!h.manager.is_authenticated().await);
        assert!(h.kv.is_empty());
    }

    #[tokio::test]
    async fn test_clear_tokens_clears_memory_even_if_store_fails() {
        let h = harness();
        h.manager.store_tokens(TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        h.kv.fail_writes(true);

        assert!(matches!(h.manager.clear_tokens().await, Err(TokenManagerError::Store(_))));
        assert!(!h.manager.is_authenticated().await);
    }
}
