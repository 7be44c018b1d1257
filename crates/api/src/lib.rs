//! # CivicReport App
//!
//! Application layer: dependency wiring and the command-line entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Logging initialization
//!
//! ## Architecture
//! - Depends on `common`, `core`, and `infra`
//! - Wires infrastructure adapters into the session controller

pub mod context;
pub mod utils;

pub use context::*;
