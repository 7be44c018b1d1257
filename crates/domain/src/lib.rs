//! # CivicReport Domain
//!
//! Business domain types for the CivicReport client.
//!
//! This crate contains:
//! - Canonical user, role and session types
//! - Wire types for the authentication and ticket endpoints
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other CivicReport crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
