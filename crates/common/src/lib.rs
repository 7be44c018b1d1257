//! Modular common utilities shared across CivicReport crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: token types and claim decoding
//! - `runtime`: key-value storage, token store and token manager
//! - `platform`: platform keychain integration
//! - `test-utils`: in-memory mocks and JWT fixtures for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod storage;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{decode_claims, DecodeError, TokenClaims, TokenPair};
#[cfg(feature = "runtime")]
pub use auth::{TokenManager, TokenManagerError};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
#[cfg(feature = "runtime")]
pub use storage::{FileKeyValueStore, KeyValueStore, StorageError};
