//! Conversions from external infrastructure errors into domain errors.

use civicreport_common::auth::TokenManagerError;
use civicreport_common::security::KeychainError;
use civicreport_common::storage::StorageError;
use civicreport_domain::CivicError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CivicError);

impl From<InfraError> for CivicError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CivicError> for InfraError {
    fn from(value: CivicError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCivicError {
    fn into_civic(self) -> CivicError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CivicError */
/* -------------------------------------------------------------------------- */

impl IntoCivicError for HttpError {
    fn into_civic(self) -> CivicError {
        if self.is_timeout() {
            return CivicError::Timeout("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return CivicError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return CivicError::Decode(format!("HTTP response body could not be decoded: {self}"));
        }

        if self.is_builder() {
            return CivicError::Internal(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => CivicError::Auth(message),
                403 => CivicError::Forbidden(message),
                404 => CivicError::NotFound(message),
                400..=499 => CivicError::InvalidInput(message),
                _ => CivicError::Server(message),
            };
        }

        CivicError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_civic())
    }
}

/* -------------------------------------------------------------------------- */
/* Storage errors → CivicError */
/* -------------------------------------------------------------------------- */

impl IntoCivicError for StorageError {
    fn into_civic(self) -> CivicError {
        match self {
            StorageError::Io(err) => CivicError::Storage(format!("storage I/O failure: {err}")),
            StorageError::Serialization(err) => {
                CivicError::Storage(format!("stored value is not valid JSON: {err}"))
            }
            StorageError::Keychain(KeychainError::NotFound) => {
                CivicError::NotFound("keychain entry not found".into())
            }
            StorageError::Keychain(KeychainError::AccessFailed(reason)) => {
                CivicError::Storage(format!("unable to access secure storage: {reason}"))
            }
            StorageError::Unavailable(reason) => CivicError::Storage(reason),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_civic())
    }
}

impl From<TokenManagerError> for InfraError {
    fn from(value: TokenManagerError) -> Self {
        let mapped = match value {
            TokenManagerError::Store(err) => err.into_civic(),
            TokenManagerError::NotAuthenticated | TokenManagerError::NoRefreshToken => {
                CivicError::Auth(value.to_string())
            }
            TokenManagerError::RefreshFailed(err) => CivicError::Auth(err.to_string()),
            TokenManagerError::Superseded => CivicError::Internal(value.to_string()),
        };
        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / io → CivicError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CivicError::Decode(format!("invalid JSON: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(CivicError::Storage(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
