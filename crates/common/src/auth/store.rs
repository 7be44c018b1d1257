//! Token persistence on top of a [`KeyValueStore`]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::traits::TokenStore;
use super::types::TokenPair;
use crate::storage::{KeyValueStore, StorageResult};

/// Stores the access and refresh tokens as two plain string entries
///
/// The entry names are part of the on-device format and are supplied by the
/// caller.
pub struct KvTokenStore {
    store: Arc<dyn KeyValueStore>,
    access_key: String,
    refresh_key: String,
}

impl KvTokenStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        access_key: impl Into<String>,
        refresh_key: impl Into<String>,
    ) -> Self {
        Self { store, access_key: access_key.into(), refresh_key: refresh_key.into() }
    }
}

#[async_trait]
impl TokenStore for KvTokenStore {
    async fn load(&self) -> StorageResult<Option<TokenPair>> {
        let Some(access_token) = self.store.get(&self.access_key).await? else {
            return Ok(None);
        };
        if access_token.trim().is_empty() {
            return Ok(None);
        }
        let refresh_token = self.store.get(&self.refresh_key).await?.filter(|t| !t.is_empty());
        Ok(Some(TokenPair { access_token, refresh_token }))
    }

    async fn save(&self, tokens: &TokenPair) -> StorageResult<()> {
        self.store.set(&self.access_key, &tokens.access_token).await?;
        match &tokens.refresh_token {
            Some(refresh) => self.store.set(&self.refresh_key, refresh).await?,
            None => self.store.remove(&self.refresh_key).await?,
        }
        debug!(has_refresh = tokens.refresh_token.is_some(), "Token pair persisted");
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        // Attempt both removals so one failing entry does not strand the other.
        let access = self.store.remove(&self.access_key).await;
        let refresh = self.store.remove(&self.refresh_key).await;
        access.and(refresh)
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::testing::MockKeychainProvider;

    fn token_store() -> (Arc<MockKeychainProvider>, KvTokenStore) {
        let kv = Arc::new(MockKeychainProvider::new("civic-test"));
        let store = KvTokenStore::new(kv.clone(), "accessToken", "refreshToken");
        (kv, store)
    }

    #[tokio::test]
    async fn save_load_clear() {
        let (kv, store) = token_store();
        assert!(store.load().await.unwrap().is_none());

        let pair = TokenPair::new("a1", Some("r1".into()));
        store.save(&pair).await.unwrap();
        assert_eq!(kv.get_secret("accessToken").unwrap(), "a1");
        assert_eq!(store.load().await.unwrap(), Some(pair));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn saving_without_refresh_token_drops_stale_one() {
        let (kv, store) = token_store();
        store.save(&TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        store.save(&TokenPair::new("a2", None)).await.unwrap();
        assert!(!kv.secret_exists("refreshToken"));
        assert_eq!(store.load().await.unwrap(), Some(TokenPair::new("a2", None)));
    }

    #[tokio::test]
    async fn empty_access_token_counts_as_no_session() {
        let (kv, store) = token_store();
        kv.set_secret("accessToken", "");
        kv.set_secret("refreshToken", "r1");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_attempts_both_keys_when_one_fails() {
        let (kv, store) = token_store();
        store.save(&TokenPair::new("a1", Some("r1".into()))).await.unwrap();
        kv.fail_key("accessToken");

        assert!(store.clear().await.is_err());
        assert!(!kv.secret_exists("refreshToken"));
    }
}
