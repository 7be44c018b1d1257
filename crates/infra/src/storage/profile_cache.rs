//! Cached user profile over a key-value store

use std::sync::Arc;

use async_trait::async_trait;
use civicreport_common::storage::KeyValueStore;
use civicreport_core::ProfileCache;
use civicreport_domain::constants::USER_PROFILE_KEY;
use civicreport_domain::{CivicError, Result, User};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Stores the canonical profile as JSON under a single key (`user`)
pub struct KvProfileCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KvProfileCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, USER_PROFILE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }
}

#[async_trait]
impl ProfileCache for KvProfileCache {
    async fn load(&self) -> Result<Option<User>> {
        let Some(raw) = self.store.get(&self.key).await.map_err(InfraError::from)? else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(key = %self.key, error = %err, "Ignoring unreadable cached profile");
                Ok(None)
            }
        }
    }

    async fn save(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user).map_err(InfraError::from)?;
        self.store.set(&self.key, &raw).await.map_err(InfraError::from)?;
        debug!(user_id = %user.id, "Profile cached");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.store
            .remove(&self.key)
            .await
            .map_err(|err| CivicError::from(InfraError::from(err)))
    }
}
