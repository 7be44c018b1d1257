use std::time::Duration;

use civicreport_domain::constants::DEFAULT_API_TIMEOUT_SECS;
use civicreport_domain::CivicError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_MAX_ATTEMPTS: usize = 2;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF_SHIFT: usize = 6;

/// Shared reqwest client with transport-level retries
///
/// Only idempotent methods are retried, on connection failures and 5xx
/// responses. A `POST` goes out exactly once, so a login or a new ticket is
/// never submitted twice. Authentication (401) is handled a layer up.
///
/// A timed-out attempt is never retried: callers bound the whole request by
/// the same duration as one attempt, so the configured timeout is the
/// longest a user waits.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and retry settings.
    ///
    /// # Errors
    /// Returns `CivicError::Config` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, CivicError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send a request, retrying idempotent ones.
    ///
    /// Any response is returned as-is once retries are spent, including 5xx.
    ///
    /// # Errors
    /// `CivicError::Network` / `CivicError::Timeout` when no response arrived.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CivicError> {
        let request = builder.build().map_err(|err| CivicError::from(InfraError::from(err)))?;
        let attempts = if is_idempotent(request.method()) { self.max_attempts } else { 1 };

        let mut attempt = 1;
        loop {
            let outcome = self.client.execute(clone_for_attempt(&request)?).await;
            let retry = attempt < attempts && should_retry(&outcome);

            match &outcome {
                Ok(response) => debug!(
                    attempt,
                    method = %request.method(),
                    url = %request.url(),
                    status = %response.status(),
                    "HTTP response"
                ),
                Err(err) => debug!(
                    attempt,
                    method = %request.method(),
                    url = %request.url(),
                    error = %err,
                    "HTTP transport failure"
                ),
            }

            if !retry {
                return outcome.map_err(|err| CivicError::from(InfraError::from(err)));
            }

            let delay = self.backoff(attempt);
            warn!(attempt, url = %request.url(), ?delay, "Retrying request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Delay before the retry that follows `attempt`: base, 2x base, 4x base...
    fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_backoff.saturating_mul(1u32 << shift)
    }
}

fn clone_for_attempt(request: &Request) -> Result<Request, CivicError> {
    request
        .try_clone()
        .ok_or_else(|| CivicError::Internal("streaming request bodies cannot be sent".into()))
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS)
}

fn should_retry(outcome: &Result<Response, reqwest::Error>) -> bool {
    match outcome {
        Ok(response) => {
            response.status().is_server_error()
                && response.status() != StatusCode::NOT_IMPLEMENTED
        }
        Err(err) => err.is_connect(),
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BACKOFF,
            user_agent: concat!("civicreport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout enforced by reqwest.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for idempotent requests (first try included).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// Returns `CivicError::Config` if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<HttpClient, CivicError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| CivicError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, max_attempts: self.max_attempts, base_backoff: self.base_backoff })
    }
}
