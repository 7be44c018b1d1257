//! Bearer-authenticated requests with one silent refresh
//!
//! Every request carries the current access token. A `401` triggers exactly
//! one token rotation through the [`TokenManager`] and one retry of the same
//! request with the new token. If the rotation fails, the original `401` is
//! handed back; a second `401` after the retry is returned as-is. This layer
//! never logs the user out, but it marks a `401` as
//! [`session_expired`](ApiResponse::session_expired) when the retry was also
//! rejected or the server refused the refresh token. A refresh endpoint that
//! is down leaves the mark unset.

use std::sync::Arc;
use std::time::Duration;

use civicreport_common::auth::TokenManager;
use civicreport_domain::CivicError;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if `body` cannot be serialized
    pub fn post<T: Serialize + ?Sized>(path: impl Into<String>, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))?;
        Ok(Self { method: Method::POST, path: path.into(), body: Some(body) })
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
    /// Set on a `401` the silent refresh could not get past
    pub session_expired: bool,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), session_expired: false }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into an [`ApiError`].
    ///
    /// # Errors
    /// Returns the classified error for any non-success status
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else if self.session_expired {
            Err(ApiError::session_expired(self.status, &self.body))
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }

    /// Deserialize the body. An empty body reads as JSON `null`.
    ///
    /// # Errors
    /// Returns `ApiError::Decode` when the body does not match `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = if self.body.trim().is_empty() { "null" } else { self.body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            ApiError::Decode(format!("{} response did not match expected shape: {e}", self.status))
        })
    }
}

/// Executes API requests with the session's bearer token
pub struct AuthenticatedFetch {
    http: HttpClient,
    base_url: String,
    tokens: Arc<TokenManager>,
    timeout: Duration,
}

impl AuthenticatedFetch {
    /// # Errors
    /// Returns `ApiError::Config` if `base_url` is not an absolute URL
    pub fn new(
        http: HttpClient,
        base_url: &str,
        tokens: Arc<TokenManager>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("Invalid API base URL {base_url}: {e}")))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), tokens, timeout })
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Send `request` with the current access token, refreshing once on 401.
    ///
    /// Without a session the request goes out unauthenticated and a 401 is
    /// returned directly.
    ///
    /// # Errors
    /// `ApiError::Network` / `ApiError::Timeout` when no response arrived.
    /// Non-2xx statuses are returned as responses, not errors.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_token = self.tokens.access_token().await;
        let mut response = self.execute(request, sent_token.as_deref()).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(sent_token) = sent_token else {
            return Ok(response);
        };

        debug!(method = %request.method, path = %request.path, "Access token rejected, refreshing");
        match self.tokens.refresh_tokens(Some(&sent_token)).await {
            Ok(fresh_token) => {
                info!(method = %request.method, path = %request.path, "Retrying with refreshed token");
                let mut retried = self.execute(request, Some(&fresh_token)).await?;
                if retried.status == StatusCode::UNAUTHORIZED {
                    warn!(path = %request.path, "Refreshed token rejected as well");
                    retried.session_expired = true;
                }
                Ok(retried)
            }
            Err(err) => {
                response.session_expired = err.is_refusal();
                warn!(
                    error = %err,
                    path = %request.path,
                    refused = response.session_expired,
                    "Token refresh failed, returning 401"
                );
                Ok(response)
            }
        }
    }

    /// Send `request` without credentials (login, registration).
    ///
    /// # Errors
    /// `ApiError::Network` / `ApiError::Timeout` when no response arrived
    pub async fn send_public(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.execute(request, None).await
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        let mut builder =
            self.http.request(request.method.clone(), &url).header(ACCEPT, "application/json");
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = self.http.send(builder).await?;
            let status = response.status();
            let body = response.text().await.map_err(|e| CivicError::from(InfraError::from(e)))?;
            Ok::<_, CivicError>(ApiResponse::new(status, body))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(method = %request.method, %url, status = %response.status, "API response");
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(method = %request.method, %url, error = %err, "API request failed");
                Err(ApiError::from_transport(err, self.timeout))
            }
            Err(_) => {
                warn!(method = %request.method, %url, timeout = ?self.timeout, "API request timed out");
                Err(ApiError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_body() {
        let request = ApiRequest::post("/login", &serde_json::json!({ "email": "a@x.com" })).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.unwrap()["email"], "a@x.com");
    }

    #[test]
    fn response_json_and_status() {
        let ok = ApiResponse::new(StatusCode::OK, r#"{"id":"1"}"#);
        let value: Value = ok.json().unwrap();
        assert_eq!(value["id"], "1");

        let empty = ApiResponse::new(StatusCode::NO_CONTENT, "");
        assert_eq!(empty.json::<Option<Value>>().unwrap(), None);

        let denied = ApiResponse::new(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(denied.clone().error_for_status(), Err(ApiError::Auth(_))));

        let expired = ApiResponse { session_expired: true, ..denied };
        assert!(matches!(expired.error_for_status(), Err(ApiError::SessionExpired(_))));

        let forbidden = ApiResponse::new(StatusCode::FORBIDDEN, "");
        assert!(matches!(forbidden.error_for_status(), Err(ApiError::Forbidden(_))));
    }
}
