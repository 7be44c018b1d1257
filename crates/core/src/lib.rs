//! # CivicReport Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The auth session state machine
//! - Port interfaces (traits) for the remote API and profile cache
//! - The profile merge rules
//!
//! ## Architecture Principles
//! - Only depends on `civicreport-common` and `civicreport-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod session;

pub use session::ports::{AuthApi, ProfileCache};
pub use session::{merge_user, AuthSessionController, RestoreOutcome, SessionError};
