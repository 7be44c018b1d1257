//! Port interfaces for the session controller
//!
//! These traits define the boundaries between the session state machine
//! and the infrastructure that talks to the server and the device.

use async_trait::async_trait;
use civicreport_domain::{
    LoginRequest, LoginResponse, ProfilePayload, RegisterRequest, RegisterResponse, Result, User,
};

/// Authentication endpoints of the remote API
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /login`
    ///
    /// Non-2xx statuses surface as errors; `CivicError::Auth` when the server
    /// refused the credentials.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// `POST /register`
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse>;

    /// Bearer `GET /user/:id`
    ///
    /// `CivicError::SessionExpired` when the server kept refusing the
    /// session's credentials after the silent refresh.
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfilePayload>;
}

/// Last-known canonical profile, kept on the device
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Load the cached profile. `Ok(None)` when nothing (readable) is cached.
    async fn load(&self) -> Result<Option<User>>;

    /// Replace the cached profile.
    async fn save(&self, user: &User) -> Result<()>;

    /// Remove the cached profile (idempotent).
    async fn clear(&self) -> Result<()>;
}
