//! Traits for token persistence and rotation
//!
//! These traits let the token manager run against the real HTTP refresh
//! endpoint and platform storage in production, and in-memory mocks in tests.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{RefreshedTokens, TokenPair};
use crate::storage::StorageResult;

/// Why a refresh call did not produce a new access token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The server answered with a non-success status
    #[error("refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The request never got an answer (connectivity, timeout)
    #[error("refresh transport failure: {0}")]
    Transport(String),

    /// The server answered 2xx without a usable access token
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

impl RefreshError {
    /// Whether the server refused the refresh token itself, as opposed to
    /// the endpoint being unreachable or misbehaving.
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Rejected { status: 400 | 401 | 403 })
    }
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Call the refresh endpoint with `refresh_token`.
    ///
    /// # Errors
    /// Returns a [`RefreshError`] when no new access token was obtained.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError>;
}

/// Durable home of the current token pair
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the persisted pair. `Ok(None)` when no access token is stored.
    async fn load(&self) -> StorageResult<Option<TokenPair>>;

    /// Persist `tokens`, replacing whatever was stored.
    async fn save(&self, tokens: &TokenPair) -> StorageResult<()>;

    /// Remove every persisted token (idempotent).
    async fn clear(&self) -> StorageResult<()>;
}
