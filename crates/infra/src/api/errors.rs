//! API-specific error types
//!
//! Classifies HTTP-layer failures before they are folded into
//! [`CivicError`] at the crate boundary.

use std::time::Duration;

use civicreport_domain::CivicError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401 or 403
    Authentication,
    /// 5xx
    Server,
    /// 4xx other than auth
    Client,
    /// Connectivity and timeouts
    Network,
    /// 2xx whose body did not have the expected shape
    Decode,
    /// Client misconfiguration
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A 401 that outlived the refresh, or whose refresh the server refused
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) | Self::Forbidden(_) | Self::SessionExpired(_) => {
                ApiErrorCategory::Authentication
            }
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether the user can reasonably retry the same call later
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Server | ApiErrorCategory::Network)
    }

    /// Classify a non-success response.
    ///
    /// The server's own `message` (or `error`) field is preferred over the
    /// raw body when the body is JSON.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = response_message(status, body);

        if status == StatusCode::UNAUTHORIZED {
            Self::Auth(message)
        } else if status == StatusCode::FORBIDDEN {
            Self::Forbidden(message)
        } else if status.is_server_error() {
            Self::Server { status: status.as_u16(), message }
        } else if status.is_client_error() {
            Self::Client { status: status.as_u16(), message }
        } else {
            Self::Network(format!("unexpected status {status}: {message}"))
        }
    }

    /// A `401` the silent refresh could not get past.
    pub fn session_expired(status: StatusCode, body: &str) -> Self {
        Self::SessionExpired(response_message(status, body))
    }

    /// Map a transport failure reported by the HTTP client.
    pub(crate) fn from_transport(err: CivicError, timeout: Duration) -> Self {
        match err {
            CivicError::Timeout(_) => Self::Timeout(timeout),
            CivicError::Auth(message) => Self::Auth(message),
            CivicError::Forbidden(message) => Self::Forbidden(message),
            CivicError::Decode(message) => Self::Decode(message),
            CivicError::Config(message) | CivicError::Internal(message) => Self::Config(message),
            other => Self::Network(other.to_string()),
        }
    }
}

fn response_message(status: StatusCode, body: &str) -> String {
    server_message(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body.trim().to_string()
        }
    })
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<ApiError> for CivicError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => CivicError::Auth(message),
            ApiError::Forbidden(message) => CivicError::Forbidden(message),
            ApiError::SessionExpired(message) => CivicError::SessionExpired(message),
            ApiError::Server { message, .. } => CivicError::Server(message),
            ApiError::Client { status: 404, message } => CivicError::NotFound(message),
            ApiError::Client { message, .. } => CivicError::InvalidInput(message),
            ApiError::Network(message) => CivicError::Network(message),
            ApiError::Timeout(after) => CivicError::Timeout(format!("no response after {after:?}")),
            ApiError::Decode(message) => CivicError::Decode(message),
            ApiError::Config(message) => CivicError::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ApiError::Auth("test".to_string()).category(), ApiErrorCategory::Authentication);
        assert_eq!(
            ApiError::Server { status: 502, message: "test".into() }.category(),
            ApiErrorCategory::Server
        );
        assert_eq!(ApiError::Timeout(Duration::from_secs(15)).category(), ApiErrorCategory::Network);
        assert_eq!(ApiError::Decode("test".into()).category(), ApiErrorCategory::Decode);
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::Network("test".to_string()).is_retryable());
        assert!(ApiError::Server { status: 500, message: "x".into() }.is_retryable());
        assert!(!ApiError::Auth("test".to_string()).is_retryable());
        assert!(!ApiError::Client { status: 400, message: "x".into() }.is_retryable());
    }

    #[test]
    fn test_from_status_prefers_server_message() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"success":false,"message":"Invalid credentials"}"#,
        );
        assert!(matches!(err, ApiError::Auth(ref m) if m == "Invalid credentials"));

        let err = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"message":"Admins only"}"#);
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Admins only"));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"email taken"}"#);
        assert!(matches!(err, ApiError::Client { status: 400, ref message } if message == "email taken"));

        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(matches!(err, ApiError::Server { status: 500, ref message } if message == "Internal Server Error"));
    }

    #[test]
    fn test_conversion_to_domain_error() {
        let not_found: CivicError = ApiError::Client { status: 404, message: "no ticket".into() }.into();
        assert_eq!(not_found, CivicError::NotFound("no ticket".into()));

        let timeout: CivicError = ApiError::Timeout(Duration::from_secs(15)).into();
        assert!(timeout.is_connectivity());

        let auth: CivicError = ApiError::Auth("expired".into()).into();
        assert!(auth.is_auth());
        assert!(!auth.is_session_expired());

        let forbidden: CivicError = ApiError::Forbidden("Admins only".into()).into();
        assert_eq!(forbidden, CivicError::Forbidden("Admins only".into()));
        assert!(!forbidden.is_auth());

        let expired: CivicError =
            ApiError::session_expired(StatusCode::UNAUTHORIZED, r#"{"message":"token expired"}"#)
                .into();
        assert_eq!(expired, CivicError::SessionExpired("token expired".into()));
    }
}
