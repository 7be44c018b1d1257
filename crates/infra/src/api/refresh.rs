//! HTTP implementation of the token refresh endpoint

use std::time::Duration;

use async_trait::async_trait;
use civicreport_common::auth::{RefreshError, RefreshedTokens, TokenRefresher};
use civicreport_domain::{RefreshRequest, RefreshResponse};
use reqwest::header::ACCEPT;
use reqwest::Method;
use tracing::{debug, instrument, warn};

use crate::http::HttpClient;

/// Calls `POST <refresh_path>` with `{"refreshToken": ...}`
///
/// Talks to [`HttpClient`] directly rather than through
/// [`AuthenticatedFetch`](super::AuthenticatedFetch): a refresh is never
/// itself refreshed.
pub struct HttpTokenRefresher {
    http: HttpClient,
    url: String,
    timeout: Duration,
}

impl HttpTokenRefresher {
    pub fn new(http: HttpClient, base_url: &str, refresh_path: &str, timeout: Duration) -> Self {
        Self { http, url: format!("{}{}", base_url.trim_end_matches('/'), refresh_path), timeout }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let body = RefreshRequest { refresh_token: refresh_token.to_string() };
        let builder = self
            .http
            .request(Method::POST, &self.url)
            .header(ACCEPT, "application/json")
            .json(&body);

        let exchange = async {
            let response = self.http.send(builder).await.map_err(|e| {
                warn!(error = %e, "Refresh endpoint unreachable");
                RefreshError::Transport(e.to_string())
            })?;
            let status = response.status();
            if !status.is_success() {
                warn!(%status, "Refresh endpoint rejected the refresh token");
                return Err(RefreshError::Rejected { status: status.as_u16() });
            }
            response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| RefreshError::InvalidResponse(e.to_string()))
        };

        let payload = tokio::time::timeout(self.timeout, exchange).await.map_err(|_| {
            warn!(timeout = ?self.timeout, "Refresh request timed out");
            RefreshError::Transport(format!("timed out after {:?}", self.timeout))
        })??;

        let access_token = payload
            .new_access_token()
            .ok_or_else(|| RefreshError::InvalidResponse("no access token in response".into()))?
            .to_string();
        let refresh_token = payload.refresh_token.filter(|t| !t.is_empty());

        debug!(rotated_refresh_token = refresh_token.is_some(), "Refresh endpoint issued a new token");
        Ok(RefreshedTokens { access_token, refresh_token })
    }
}
