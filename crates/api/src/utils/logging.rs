use std::time::Duration;

use civicreport_domain::{CivicError, LoggingConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. With `config.json` set,
/// events are written as one JSON object per line.
///
/// # Errors
/// Returns `CivicError::Config` for an invalid filter directive and
/// `CivicError::Internal` when a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), CivicError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| CivicError::Config(format!("Invalid log level '{}': {e}", config.level)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| CivicError::Internal(format!("Failed to install tracing subscriber: {e}")))
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding credentials in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `CivicError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &CivicError) -> &'static str {
    match error {
        CivicError::Network(_) => "network",
        CivicError::Timeout(_) => "timeout",
        CivicError::Auth(_) => "auth",
        CivicError::Forbidden(_) => "forbidden",
        CivicError::SessionExpired(_) => "session_expired",
        CivicError::Decode(_) => "decode",
        CivicError::Server(_) => "server",
        CivicError::NotFound(_) => "not_found",
        CivicError::InvalidInput(_) => "invalid_input",
        CivicError::Storage(_) => "storage",
        CivicError::Config(_) => "config",
        CivicError::Internal(_) => "internal",
    }
}
