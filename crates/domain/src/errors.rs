//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CivicReport
///
/// Mirrors the client-facing taxonomy: connectivity (`Network`, `Timeout`),
/// credential problems (`Auth`, `Forbidden`), malformed tokens or payloads
/// (`Decode`), and non-2xx responses carrying a body (`Server`).
///
/// `SessionExpired` is reserved for a `401` that survived the silent refresh,
/// or whose refresh the server refused. It is the only error that ends an
/// established session.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CivicError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CivicError {
    /// Whether the failure came from the remote side rejecting credentials.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether the server refused the session's credentials for good.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// Whether the failure is a connectivity problem the user can retry.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Result type alias for CivicReport operations
pub type Result<T> = std::result::Result<T, CivicError>;
