//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: unsigned JWT builders
//! - **[`mocks`]**: in-memory key-value store and scripted token refresher
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use civicreport_common::auth::{KvTokenStore, TokenManager};
//! use civicreport_common::testing::{MockKeychainProvider, MockTokenRefresher};
//!
//! let kv = Arc::new(MockKeychainProvider::new("civic-test"));
//! let store = Arc::new(KvTokenStore::new(kv, "accessToken", "refreshToken"));
//! let manager = TokenManager::new(Arc::new(MockTokenRefresher::new()), store);
//! # let _ = manager;
//! ```

pub mod fixtures;
pub mod mocks;

pub use fixtures::{fake_jwt, jwt_for};
pub use mocks::{MockKeychainProvider, MockTokenRefresher};
