//! [`KeyValueStore`] over the platform keychain
//!
//! `keyring` calls are blocking; they are short and rare (login, logout,
//! rotation), so they run inline on the calling task.

use async_trait::async_trait;

use super::error::StorageResult;
use super::kv::KeyValueStore;
use crate::security::{KeychainError, KeychainProvider};

#[async_trait]
impl KeyValueStore for KeychainProvider {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.get_secret(key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Ok(self.set_secret(key, value)?)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        Ok(self.delete_secret(key)?)
    }
}
