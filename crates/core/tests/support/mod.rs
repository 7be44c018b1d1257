//! Shared fakes for the session controller tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use civicreport_common::auth::{KvTokenStore, TokenManager};
use civicreport_common::testing::{MockKeychainProvider, MockTokenRefresher};
use civicreport_core::{AuthApi, AuthSessionController, ProfileCache};
use civicreport_domain::{
    CivicError, LoginRequest, LoginResponse, ProfilePayload, RegisterRequest, RegisterResponse,
    Result, User,
};
use parking_lot::Mutex;

/// Scripted remote API
///
/// Each endpoint serves its queued responses in order; an exhausted queue
/// answers with a network error.
#[derive(Default)]
pub struct MockAuthApi {
    logins: Mutex<VecDeque<Result<LoginResponse>>>,
    registrations: Mutex<VecDeque<Result<RegisterResponse>>>,
    profiles: Mutex<VecDeque<Result<ProfilePayload>>>,
    login_delay: Mutex<Option<Duration>>,
    profile_delay: Mutex<Option<Duration>>,
    login_requests: Mutex<Vec<String>>,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl MockAuthApi {
    pub fn push_login(&self, response: Result<LoginResponse>) {
        self.logins.lock().push_back(response);
    }

    pub fn push_register(&self, response: Result<RegisterResponse>) {
        self.registrations.lock().push_back(response);
    }

    pub fn push_profile(&self, response: Result<ProfilePayload>) {
        self.profiles.lock().push_back(response);
    }

    pub fn set_login_delay(&self, delay: Duration) {
        *self.login_delay.lock() = Some(delay);
    }

    pub fn set_profile_delay(&self, delay: Duration) {
        *self.profile_delay.lock() = Some(delay);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Emails of every login request, in call order
    pub fn login_emails(&self) -> Vec<String> {
        self.login_requests.lock().clone()
    }
}

fn unscripted<T>(endpoint: &str) -> Result<T> {
    Err(CivicError::Network(format!("no scripted response for {endpoint}")))
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_requests.lock().push(request.email.clone());
        let delay = *self.login_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.logins.lock().pop_front().unwrap_or_else(|| unscripted("login"))
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<RegisterResponse> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registrations.lock().pop_front().unwrap_or_else(|| unscripted("register"))
    }

    async fn fetch_profile(&self, _user_id: &str) -> Result<ProfilePayload> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.profile_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.profiles.lock().pop_front().unwrap_or_else(|| unscripted("profile"))
    }
}

/// Profile cache held in memory
#[derive(Default)]
pub struct MemoryProfileCache {
    user: Mutex<Option<User>>,
    saves: AtomicUsize,
}

impl MemoryProfileCache {
    pub fn with_user(user: User) -> Self {
        Self { user: Mutex::new(Some(user)), saves: AtomicUsize::new(0) }
    }

    pub fn current(&self) -> Option<User> {
        self.user.lock().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileCache for MemoryProfileCache {
    async fn load(&self) -> Result<Option<User>> {
        Ok(self.current())
    }

    async fn save(&self, user: &User) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.user.lock() = Some(user.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.user.lock() = None;
        Ok(())
    }
}

pub struct Harness {
    pub controller: AuthSessionController,
    pub api: Arc<MockAuthApi>,
    pub cache: Arc<MemoryProfileCache>,
    pub kv: Arc<MockKeychainProvider>,
    pub refresher: Arc<MockTokenRefresher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(MemoryProfileCache::default()),
            Arc::new(MockKeychainProvider::new("civic-test")),
        )
    }

    /// Harness over existing storage, as after an application restart
    pub fn with_parts(cache: Arc<MemoryProfileCache>, kv: Arc<MockKeychainProvider>) -> Self {
        let api = Arc::new(MockAuthApi::default());
        let refresher = Arc::new(MockTokenRefresher::new());
        let store = Arc::new(KvTokenStore::new(kv.clone(), "accessToken", "refreshToken"));
        let tokens = Arc::new(TokenManager::new(refresher.clone(), store));
        let controller = AuthSessionController::new(api.clone(), tokens, cache.clone());
        Self { controller, api, cache, kv, refresher }
    }

    /// Seed persisted tokens as a previous run would have left them.
    pub fn persist_tokens(&self, access_token: &str, refresh_token: &str) {
        self.kv.set_secret("accessToken", access_token);
        self.kv.set_secret("refreshToken", refresh_token);
    }
}
