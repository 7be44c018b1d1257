//! Application constants
//!
//! Storage keys are part of the on-device contract: a reinstall of the
//! client must find tokens and the cached profile under the same names.

// Key-value storage keys
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_PROFILE_KEY: &str = "user";

// File store
pub const KV_STORE_FILE_NAME: &str = "storage.json";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "CivicReport";

// API defaults
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_REGISTER_PATH: &str = "/register";
pub const DEFAULT_USER_PATH: &str = "/user";
pub const DEFAULT_REFRESH_PATH: &str = "/refresh";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
