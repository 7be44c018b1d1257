//! Token types shared by the token store, manager and decoder

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer access token plus the optional refresh token issued with it
///
/// Both values are opaque to the client. `Debug` never prints them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token }
    }

    /// Apply a rotation result, keeping the current refresh token when the
    /// server did not issue a new one.
    #[must_use]
    pub fn rotated(&self, refreshed: RefreshedTokens) -> Self {
        Self {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or_else(|| self.refresh_token.clone()),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(redact))
            .finish()
    }
}

/// Result of a successful refresh call
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// `None` when the server only rotated the access token
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("access_token", &redact(&self.access_token))
            .field("rotated_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Identity claims read from an access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier, rendered as a string
    pub id: String,
    /// Empty when the token carries no email claim
    pub email: String,
    /// Lower-cased role name, or the mapped name for numeric role claims
    pub role: String,
    pub tenant_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenClaims {
    /// Whether the `exp` claim is in the past. Tokens without `exp` never
    /// expire from the client's point of view.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

fn redact(token: &str) -> String {
    format!("<redacted:{} chars>", token.len())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn debug_redacts_tokens() {
        let pair = TokenPair::new("eyJ.secret.sig", Some("refresh-secret".into()));
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn rotation_keeps_refresh_token_when_omitted() {
        let pair = TokenPair::new("a1", Some("r1".into()));
        let rotated =
            pair.rotated(RefreshedTokens { access_token: "a2".into(), refresh_token: None });
        assert_eq!(rotated, TokenPair::new("a2", Some("r1".into())));

        let replaced = pair.rotated(RefreshedTokens {
            access_token: "a3".into(),
            refresh_token: Some("r3".into()),
        });
        assert_eq!(replaced.refresh_token.as_deref(), Some("r3"));
    }

    #[test]
    fn expiry_check() {
        let now = Utc::now();
        let mut claims = TokenClaims {
            id: "1".into(),
            email: String::new(),
            role: "citizen".into(),
            tenant_id: None,
            expires_at: None,
        };
        assert!(!claims.is_expired_at(now));
        claims.expires_at = Some(now - Duration::seconds(1));
        assert!(claims.is_expired_at(now));
        claims.expires_at = Some(now + Duration::minutes(5));
        assert!(!claims.is_expired_at(now));
    }
}
