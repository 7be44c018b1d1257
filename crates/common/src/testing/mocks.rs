//! Mock implementations of the storage and refresh traits
//!
//! Both mocks are cheap to clone-by-`Arc` and safe to drive from several
//! tasks at once.

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{RefreshError, RefreshedTokens, TokenRefresher};
use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// In-memory stand-in for the platform keychain
///
/// Implements [`KeyValueStore`] and supports failure injection per key or
/// for all writes.
#[derive(Debug, Default)]
pub struct MockKeychainProvider {
    storage: Mutex<HashMap<String, String>>,
    failing_keys: Mutex<HashSet<String>>,
    fail_writes: Mutex<bool>,
    service_name: String,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), ..Self::default() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a value directly, bypassing failure injection.
    pub fn set_secret(&self, key: &str, value: &str) {
        self.storage.lock().insert(key.to_string(), value.to_string());
    }

    /// Read a value directly, bypassing failure injection.
    #[must_use]
    pub fn get_secret(&self, key: &str) -> Option<String> {
        self.storage.lock().get(key).cloned()
    }

    #[must_use]
    pub fn secret_exists(&self, key: &str) -> bool {
        self.storage.lock().contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    /// Sorted list of stored keys
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.storage.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Make every operation on `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().insert(key.to_string());
    }

    /// Make every `set`/`remove` fail while `enabled`.
    pub fn fail_writes(&self, enabled: bool) {
        *self.fail_writes.lock() = enabled;
    }

    fn check_key(&self, key: &str) -> StorageResult<()> {
        if self.failing_keys.lock().contains(key) {
            return Err(StorageError::Unavailable(format!("injected failure for {key}")));
        }
        Ok(())
    }

    fn check_write(&self, key: &str) -> StorageResult<()> {
        self.check_key(key)?;
        if *self.fail_writes.lock() {
            return Err(StorageError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MockKeychainProvider {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_key(key)?;
        Ok(self.get_secret(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_write(key)?;
        self.set_secret(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_write(key)?;
        self.storage.lock().remove(key);
        Ok(())
    }
}

/// Scripted [`TokenRefresher`]
///
/// Responses are served in the order they were pushed. Once the script is
/// exhausted every call fails with `RefreshError::Rejected { status: 401 }`.
#[derive(Debug, Default)]
pub struct MockTokenRefresher {
    responses: Mutex<VecDeque<Result<RefreshedTokens, RefreshError>>>,
    seen: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockTokenRefresher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful rotation.
    pub fn push_ok(&self, tokens: RefreshedTokens) {
        self.responses.lock().push_back(Ok(tokens));
    }

    /// Queue a failure.
    pub fn push_err(&self, err: RefreshError) {
        self.responses.lock().push_back(Err(err));
    }

    /// Sleep this long inside every call before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens received, in call order
    #[must_use]
    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(refresh_token.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses.lock().pop_front().unwrap_or(Err(RefreshError::Rejected { status: 401 }))
    }
}
