//! Bearer token infrastructure
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  In-memory pair, generation guard, serialized rotation
//! └────────┬────────┘
//!          │
//!          ├──► TokenRefresher   (HTTP refresh endpoint, implemented in infra)
//!          └──► TokenStore       (KvTokenStore over file or keychain storage)
//!
//! decode_claims()                (identity claims from the access token)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenPair`, `RefreshedTokens`, `TokenClaims`
//! - **[`claims`]**: JWT payload decoding (no signature verification)
//! - **[`traits`]**: `TokenRefresher` and `TokenStore` seams
//! - **[`store`]**: `KvTokenStore`
//! - **[`token_manager`]**: token lifecycle

pub mod claims;
pub mod types;

#[cfg(feature = "runtime")]
pub mod store;
#[cfg(feature = "runtime")]
pub mod token_manager;
#[cfg(feature = "runtime")]
pub mod traits;

pub use claims::{decode_claims, decode_payload, DecodeError};
#[cfg(feature = "runtime")]
pub use store::KvTokenStore;
#[cfg(feature = "runtime")]
pub use token_manager::{TokenManager, TokenManagerError};
#[cfg(feature = "runtime")]
pub use traits::{RefreshError, TokenRefresher, TokenStore};
pub use types::{RefreshedTokens, TokenClaims, TokenPair};
