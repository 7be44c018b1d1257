//! Session error and outcome types

use civicreport_common::auth::{DecodeError, TokenManagerError};
use civicreport_domain::CivicError;
use thiserror::Error;

/// Why a session operation did not change the session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server refused the credentials or the registration
    #[error("rejected: {0}")]
    Rejected(String),

    /// The access token issued by the server could not be decoded
    #[error("invalid access token: {0}")]
    Decode(#[from] DecodeError),

    /// Transport or server failure
    #[error(transparent)]
    Api(#[from] CivicError),

    /// The session changed (logout, another login) while the call was in
    /// flight; its result was discarded
    #[error("superseded by a newer session change")]
    Superseded,

    /// The operation needs an authenticated session
    #[error("not authenticated")]
    NotAuthenticated,

    /// The account was created but the follow-up login failed
    #[error("account registered but login failed: {0}")]
    RegisteredButLoginFailed(#[source] Box<SessionError>),

    /// Tokens could not be persisted
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl From<TokenManagerError> for SessionError {
    fn from(err: TokenManagerError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl SessionError {
    /// Whether retrying later could succeed without user action.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(err) => err.is_connectivity(),
            Self::RegisteredButLoginFailed(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

/// Result of reading the persisted session at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A token pair was found and decoded; the session is authenticated
    Restored,
    /// No token pair was stored; the session is anonymous
    NoSession,
    /// A token was stored but could not be decoded; it was discarded and the
    /// session is anonymous
    DecodeFailed(DecodeError),
    /// A login or logout completed while persisted state was being read
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SessionError::Api(CivicError::Timeout("15s".into())).is_transient());
        assert!(!SessionError::Rejected("bad password".into()).is_transient());
        let wrapped = SessionError::RegisteredButLoginFailed(Box::new(SessionError::Api(
            CivicError::Network("offline".into()),
        )));
        assert!(wrapped.is_transient());
        assert!(wrapped.to_string().contains("registered"));
    }
}
