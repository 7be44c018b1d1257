//! # CivicReport Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP transport and the authenticated API client
//! - The token refresh endpoint client
//! - The device profile cache
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `civicreport-core` and
//!   `civicreport-common`
//! - Contains all "impure" code (network, files, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiError, AuthenticatedFetch, CivicApiClient, HttpTokenRefresher};
pub use errors::InfraError;
pub use http::HttpClient;
pub use storage::KvProfileCache;
