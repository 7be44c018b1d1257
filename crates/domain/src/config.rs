//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_API_TIMEOUT_SECS, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_LOG_LEVEL, DEFAULT_REFRESH_PATH,
    DEFAULT_RETRY_ATTEMPTS,
};
use crate::impl_domain_status_conversions;
use crate::{CivicError, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Path of the token refresh endpoint
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Retries for transport failures; 401 handling is separate
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

/// Where tokens are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON file under `data_dir`
    #[default]
    File,
    /// Platform keychain
    Keychain,
}

impl_domain_status_conversions!(TokenBackend {
    File => "file",
    Keychain => "keychain",
});

/// Local storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub token_backend: TokenBackend,
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

impl ApiConfig {
    /// API config with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout_seconds(),
            refresh_path: default_refresh_path(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl StorageConfig {
    /// File-backed storage rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            token_backend: TokenBackend::File,
            keychain_service: default_keychain_service(),
        }
    }
}

impl Config {
    /// Check values serde cannot check.
    ///
    /// # Errors
    /// Returns `CivicError::Config` for an unparsable or non-HTTP base URL,
    /// a zero timeout, or a refresh path that does not start with `/`.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| CivicError::Config(format!("Invalid API base URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CivicError::Config(format!(
                "Unsupported API base URL scheme: {}",
                url.scheme()
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(CivicError::Config("API timeout must be greater than zero".into()));
        }
        if !self.api.refresh_path.starts_with('/') {
            return Err(CivicError::Config(format!(
                "Refresh path must start with '/': {}",
                self.api.refresh_path
            )));
        }
        if self.storage.keychain_service.trim().is_empty() {
            return Err(CivicError::Config("Keychain service name is empty".into()));
        }
        Ok(())
    }
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            api: ApiConfig::new("https://api.civic.example"),
            storage: StorageConfig::new("/tmp/civic"),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn defaults_validate() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_seconds, 15);
        assert_eq!(config.api.refresh_path, "/refresh");
        assert_eq!(config.storage.token_backend, TokenBackend::File);
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut config = sample();
        config.api.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(CivicError::Config(_))));

        config.api.base_url = "ftp://files.example".into();
        assert!(matches!(config.validate(), Err(CivicError::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = sample();
        config.api.timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn rejects_relative_refresh_path() {
        let mut config = sample();
        config.api.refresh_path = "refresh".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{
            "api": { "base_url": "http://localhost:3000" },
            "storage": { "data_dir": "/var/lib/civic", "token_backend": "keychain" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api.retry_attempts, 1);
        assert_eq!(config.storage.token_backend, TokenBackend::Keychain);
        assert_eq!(config.storage.keychain_service, "CivicReport");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn token_backend_parses_case_insensitively() {
        assert_eq!("KEYCHAIN".parse::<TokenBackend>().unwrap(), TokenBackend::Keychain);
        assert!("sqlite".parse::<TokenBackend>().is_err());
    }
}
