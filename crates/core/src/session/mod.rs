//! Client session lifecycle
//!
//! [`AuthSessionController`] owns the session: it restores persisted tokens
//! at start-up, logs users in and out, and keeps the exposed user profile in
//! line with the most recently decoded access token.

pub mod controller;
pub mod error;
pub mod merge;
pub mod ports;

pub use controller::AuthSessionController;
pub use error::{RestoreOutcome, SessionError};
pub use merge::merge_user;
