//! Remote API access
//!
//! # Architecture
//!
//! - [`HttpClient`](crate::http::HttpClient) carries transport retries and
//!   the reqwest timeout
//! - [`AuthenticatedFetch`] adds the bearer token, one refresh on 401 and a
//!   hard per-request timeout
//! - [`HttpTokenRefresher`] is the refresh endpoint the token manager calls
//! - [`CivicApiClient`] maps endpoints to domain types and implements the
//!   session's `AuthApi` port

pub mod client;
pub mod errors;
pub mod fetch;
pub mod refresh;

pub use client::CivicApiClient;
pub use errors::{ApiError, ApiErrorCategory};
pub use fetch::{ApiRequest, ApiResponse, AuthenticatedFetch};
pub use refresh::HttpTokenRefresher;
