//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whichever source wins, the result is checked with [`Config::validate`].
//!
//! ## Environment Variables
//! - `CIVIC_API_BASE_URL`: API base URL (required)
//! - `CIVIC_DATA_DIR`: Directory for the key-value store (required)
//! - `CIVIC_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `CIVIC_API_REFRESH_PATH`: Path of the token refresh endpoint
//! - `CIVIC_API_RETRY_ATTEMPTS`: Transport retries for idempotent requests
//! - `CIVIC_TOKEN_BACKEND`: `file` or `keychain`
//! - `CIVIC_KEYCHAIN_SERVICE`: Keychain service name
//! - `CIVIC_LOG_LEVEL`: Default log filter
//! - `CIVIC_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./civicreport.json` or `./civicreport.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use civicreport_domain::{
    ApiConfig, CivicError, Config, LoggingConfig, Result, StorageConfig, TokenBackend,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CivicError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or values fail validation
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// The required variables must be present; optional ones fall back to the
/// same defaults a config file would get.
///
/// # Errors
/// Returns `CivicError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("CIVIC_API_BASE_URL")?;
    let data_dir = env_var("CIVIC_DATA_DIR")?;

    let mut api = ApiConfig::new(base_url);
    if let Some(timeout) = env_parse::<u64>("CIVIC_API_TIMEOUT_SECS", "timeout")? {
        api.timeout_seconds = timeout;
    }
    if let Ok(path) = std::env::var("CIVIC_API_REFRESH_PATH") {
        api.refresh_path = path;
    }
    if let Some(attempts) = env_parse::<u32>("CIVIC_API_RETRY_ATTEMPTS", "retry attempts")? {
        api.retry_attempts = attempts;
    }

    let mut storage = StorageConfig::new(PathBuf::from(data_dir));
    if let Ok(backend) = std::env::var("CIVIC_TOKEN_BACKEND") {
        storage.token_backend = TokenBackend::from_str(&backend)
            .map_err(|e| CivicError::Config(format!("Invalid token backend: {}", e)))?;
    }
    if let Ok(service) = std::env::var("CIVIC_KEYCHAIN_SERVICE") {
        storage.keychain_service = service;
    }

    let mut logging = LoggingConfig::default();
    if let Ok(level) = std::env::var("CIVIC_LOG_LEVEL") {
        logging.level = level;
    }
    logging.json = env_bool("CIVIC_LOG_JSON", false);

    Ok(Config { api, storage, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `CivicError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CivicError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CivicError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CivicError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `CivicError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CivicError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CivicError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CivicError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./civicreport.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("civicreport.json"),
        dir.join("civicreport.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `CivicError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| CivicError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional environment variable.
///
/// # Errors
/// Returns `CivicError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CivicError::Config(format!("Invalid {}: {}", what, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
