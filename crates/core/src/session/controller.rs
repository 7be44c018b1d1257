//! Session state machine
//!
//! States: `loading` until [`AuthSessionController::restore`] has read the
//! persisted state, then `authenticated` or `anonymous`.
//!
//! Every login, direct login and logout advances the session epoch. Async
//! work (profile fetches, login round-trips) records the epoch it started in
//! and is dropped on arrival if the epoch moved. State changes and the
//! storage writes that go with them happen under one async mutex, so a late
//! result can never overwrite a logout.

use std::sync::Arc;

use civicreport_common::auth::{decode_claims, TokenClaims, TokenManager, TokenPair};
use civicreport_domain::{
    CivicError, LoginRequest, ProfilePayload, RegisterRequest, SessionSnapshot, User,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{RestoreOutcome, SessionError};
use super::merge::merge_user;
use super::ports::{AuthApi, ProfileCache};

struct SessionState {
    epoch: u64,
    current: SessionSnapshot,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    tokens: Arc<TokenManager>,
    cache: Arc<dyn ProfileCache>,
    state: Mutex<SessionState>,
    publisher: watch::Sender<SessionSnapshot>,
    pending: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Auth session controller
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AuthSessionController {
    inner: Arc<Inner>,
}

impl AuthSessionController {
    pub fn new(
        api: Arc<dyn AuthApi>,
        tokens: Arc<TokenManager>,
        cache: Arc<dyn ProfileCache>,
    ) -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::loading());
        Self {
            inner: Arc::new(Inner {
                api,
                tokens,
                cache,
                state: Mutex::new(SessionState { epoch: 0, current: SessionSnapshot::loading() }),
                publisher,
                pending: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Receive every published session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.publisher.subscribe()
    }

    /// Most recently published session state
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.publisher.borrow().clone()
    }

    /// Token manager backing this session
    #[must_use]
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.inner.tokens
    }

    /// Read the persisted token pair and profile and leave `loading`.
    ///
    /// With a decodable token pair the session becomes `authenticated` right
    /// away from the cached profile and token claims, and a fresh profile is
    /// fetched in the background (see [`await_profile_refresh`]).
    ///
    /// [`await_profile_refresh`]: Self::await_profile_refresh
    pub async fn restore(&self) -> RestoreOutcome {
        let epoch = self.inner.state.lock().await.epoch;

        let (tokens, cached) =
            tokio::join!(self.inner.tokens.initialize(), self.inner.cache.load());
        let tokens = tokens.unwrap_or_else(|err| {
            warn!(error = %err, "Failed to read persisted tokens");
            None
        });
        let cached = cached.unwrap_or_else(|err| {
            warn!(error = %err, "Failed to read cached profile");
            None
        });

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            debug!(started = epoch, current = state.epoch, "Session changed during restore");
            return RestoreOutcome::Superseded;
        }

        let Some(pair) = tokens else {
            if let Err(err) = self.inner.cache.clear().await {
                warn!(error = %err, "Failed to clear stale cached profile");
            }
            let snapshot = SessionSnapshot::anonymous(state.epoch);
            self.publish(&mut state, snapshot);
            info!("No persisted session");
            return RestoreOutcome::NoSession;
        };

        let claims = match decode_claims(&pair.access_token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "Persisted access token is unreadable, discarding session");
                self.clear_storage().await;
                let snapshot = SessionSnapshot::anonymous(state.epoch);
                self.publish(&mut state, snapshot);
                return RestoreOutcome::DecodeFailed(err);
            }
        };

        let user = merge_user(None, &claims, cached.as_ref());
        info!(user_id = %user.id, role = %user.role, "Session restored");
        let snapshot = SessionSnapshot::authenticated(user, epoch);
        self.publish(&mut state, snapshot);
        drop(state);

        self.spawn_profile_fetch(epoch);
        RestoreOutcome::Restored
    }

    /// Wait for the background profile fetch started by the last restore or
    /// login, if any.
    pub async fn await_profile_refresh(&self) {
        let handle = self.inner.pending.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "Profile fetch task failed");
            }
        }
    }

    /// Fetch the profile of the signed-in user now and merge it.
    ///
    /// # Errors
    /// - `NotAuthenticated` without a session
    /// - `Superseded` if the session changed while the request was in flight
    /// - `Api` when the fetch failed; only `CivicError::SessionExpired` also
    ///   ends the session
    pub async fn refresh_profile(&self) -> Result<User, SessionError> {
        let epoch = {
            let state = self.inner.state.lock().await;
            if !state.current.is_authenticated() {
                return Err(SessionError::NotAuthenticated);
            }
            state.epoch
        };
        self.fetch_profile(epoch).await
    }

    /// Sign in with email and password.
    ///
    /// Failures leave the session unchanged and are not retried.
    ///
    /// # Errors
    /// - `Rejected` when the server refused the credentials
    /// - `Decode` when the issued token is unreadable
    /// - `Api` on transport or server failure
    /// - `Superseded` if the session changed before the response arrived
    /// - `Storage` if the tokens could not be persisted
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let epoch = self.inner.state.lock().await.epoch;
        debug!(email, "Logging in");

        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        let response = self.inner.api.login(&request).await.map_err(rejection)?;

        let Some(access_token) = response.accepted_token() else {
            let message = response.message.clone().unwrap_or_else(|| "Login failed".to_string());
            info!(email, reason = %message, "Login rejected");
            return Err(SessionError::Rejected(message));
        };

        let claims = decode_claims(access_token)?;
        let profile = response.user.clone().and_then(ProfilePayload::from_response);
        let pair = TokenPair::new(access_token, response.refresh_token.clone());

        let (user, new_epoch) = self.establish(Some(epoch), pair, &claims, profile.as_ref()).await?;
        info!(user_id = %user.id, role = %user.role, "Logged in");

        if profile.is_none() {
            self.spawn_profile_fetch(new_epoch);
        }
        Ok(user)
    }

    /// Create an account and sign in with the same credentials.
    ///
    /// Not atomic: when the account is created but the login fails the
    /// result is `RegisteredButLoginFailed` and the account still exists.
    ///
    /// # Errors
    /// `Rejected`/`Api` from registration, or `RegisteredButLoginFailed`
    pub async fn register(&self, request: RegisterRequest) -> Result<User, SessionError> {
        let response = self.inner.api.register(&request).await.map_err(rejection)?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "Registration failed".to_string());
            info!(email = %request.email, reason = %message, "Registration rejected");
            return Err(SessionError::Rejected(message));
        }

        info!(email = %request.email, "Account registered");
        self.login(&request.email, &request.password).await.map_err(|err| {
            warn!(error = %err, "Login after registration failed");
            SessionError::RegisteredButLoginFailed(Box::new(err))
        })
    }

    /// Enter a session from credentials obtained elsewhere (federated login).
    ///
    /// # Errors
    /// `Decode` when the access token is unreadable, `Storage` when it
    /// cannot be persisted
    pub async fn set_direct_login(&self, tokens: TokenPair, user: User) -> Result<User, SessionError> {
        let claims = decode_claims(&tokens.access_token)?;
        let profile = ProfilePayload::from(&user);
        let (user, _) = self.establish(None, tokens, &claims, Some(&profile)).await?;
        info!(user_id = %user.id, role = %user.role, "Direct login accepted");
        Ok(user)
    }

    /// End the session.
    ///
    /// Always leaves the session `anonymous`. Storage failures are logged.
    /// Requests still in flight are not cancelled; their results are dropped
    /// when they arrive.
    pub async fn logout(&self) {
        let mut state = self.inner.state.lock().await;
        self.end_session(&mut state).await;
        info!(epoch = state.epoch, "Logged out");
    }

    async fn establish(
        &self,
        expected_epoch: Option<u64>,
        pair: TokenPair,
        claims: &TokenClaims,
        profile: Option<&ProfilePayload>,
    ) -> Result<(User, u64), SessionError> {
        let mut state = self.inner.state.lock().await;
        if let Some(expected) = expected_epoch {
            if state.epoch != expected {
                warn!(started = expected, current = state.epoch, "Discarding stale login response");
                return Err(SessionError::Superseded);
            }
        }

        self.inner.tokens.store_tokens(pair).await?;

        let user = merge_user(profile, claims, None);
        if let Err(err) = self.inner.cache.save(&user).await {
            warn!(error = %err, "Failed to cache profile");
        }

        state.epoch += 1;
        let epoch = state.epoch;
        self.publish(&mut state, SessionSnapshot::authenticated(user.clone(), epoch));
        Ok((user, epoch))
    }

    async fn fetch_profile(&self, epoch: u64) -> Result<User, SessionError> {
        let user_id = {
            let state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return Err(SessionError::Superseded);
            }
            state.current.user.as_ref().map(|u| u.id.clone()).ok_or(SessionError::NotAuthenticated)?
        };

        let fetched = self.inner.api.fetch_profile(&user_id).await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch || !state.current.is_authenticated() {
            debug!(started = epoch, current = state.epoch, "Discarding stale profile");
            return Err(SessionError::Superseded);
        }

        match fetched {
            Ok(profile) => {
                let Some(access_token) = self.inner.tokens.access_token().await else {
                    return Err(SessionError::NotAuthenticated);
                };
                let claims = decode_claims(&access_token)?;
                let user = merge_user(Some(&profile), &claims, state.current.user.as_ref());
                if let Err(err) = self.inner.cache.save(&user).await {
                    warn!(error = %err, "Failed to cache profile");
                }
                debug!(user_id = %user.id, "Profile refreshed");
                self.publish(&mut state, SessionSnapshot::authenticated(user.clone(), epoch));
                Ok(user)
            }
            Err(err) if err.is_session_expired() => {
                warn!(error = %err, "Session credentials refused, ending session");
                self.end_session(&mut state).await;
                Err(SessionError::Api(err))
            }
            Err(err) => {
                warn!(error = %err, "Profile fetch failed, keeping current profile");
                Err(SessionError::Api(err))
            }
        }
    }

    fn spawn_profile_fetch(&self, epoch: u64) {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            match controller.fetch_profile(epoch).await {
                Ok(_) | Err(SessionError::Superseded) => {}
                Err(err) => debug!(epoch, error = %err, "Background profile fetch did not apply"),
            }
        });
        *self.inner.pending.lock() = Some(handle);
    }

    async fn end_session(&self, state: &mut SessionState) {
        state.epoch += 1;
        self.clear_storage().await;
        let snapshot = SessionSnapshot::anonymous(state.epoch);
        self.publish(state, snapshot);
    }

    async fn clear_storage(&self) {
        if let Err(err) = self.inner.tokens.clear_tokens().await {
            warn!(error = %err, "Failed to clear persisted tokens");
        }
        if let Err(err) = self.inner.cache.clear().await {
            warn!(error = %err, "Failed to clear cached profile");
        }
    }

    fn publish(&self, state: &mut SessionState, snapshot: SessionSnapshot) {
        state.current = snapshot.clone();
        self.inner.publisher.send_replace(snapshot);
    }
}

fn rejection(err: CivicError) -> SessionError {
    match err {
        CivicError::Auth(message)
        | CivicError::Forbidden(message)
        | CivicError::InvalidInput(message) => {
            SessionError::Rejected(message)
        }
        other => SessionError::Api(other),
    }
}
