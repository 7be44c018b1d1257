//! Key-value storage for session state
//!
//! The client persists three small string values (access token, refresh
//! token, cached profile). [`KeyValueStore`] abstracts over where they live:
//! a JSON file in the data directory or the platform keychain.

pub mod error;
#[cfg(feature = "platform")]
pub mod keychain;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use kv::{FileKeyValueStore, KeyValueStore};
