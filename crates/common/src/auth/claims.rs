//! Access token payload decoding
//!
//! Reads the identity claims out of a three-segment JWT. The signature is
//! not verified: the server is the only party that trusts these claims, the
//! client just needs to know who it is and what it may show.
//!
//! Claim conventions vary between backend deployments:
//! - subject: `id`, `sub`, `userId` or `user_id`, string or number
//! - tenant: `tenantId` or `tenant_id`, string or number
//! - role: a name in any casing, or an integer code

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::TokenClaims;

const SUBJECT_CLAIMS: [&str; 4] = ["id", "sub", "userId", "user_id"];
const TENANT_CLAIMS: [&str; 2] = ["tenantId", "tenant_id"];

/// Reasons an access token could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("token payload is not valid base64url: {0}")]
    Base64(String),

    #[error("token payload is not valid UTF-8")]
    Utf8,

    #[error("token payload is not valid JSON: {0}")]
    Json(String),

    #[error("token payload is not a JSON object")]
    NotAnObject,

    #[error("token payload has no subject claim")]
    MissingSubject,
}

/// Decode the identity claims of an access token.
///
/// Role mapping: string roles are lower-cased as-is (a numeric string such
/// as `"1"` stays `"1"`); integer roles map 1 → operator, 2 → manager,
/// 3 → admin and anything else to citizen; a missing or null role is
/// citizen.
///
/// # Errors
/// Returns a [`DecodeError`] describing the first structural problem found.
pub fn decode_claims(token: &str) -> Result<TokenClaims, DecodeError> {
    let payload = decode_payload(token)?;

    let id = first_scalar(&payload, &SUBJECT_CLAIMS).ok_or(DecodeError::MissingSubject)?;
    let email = payload.get("email").and_then(Value::as_str).unwrap_or_default().to_string();
    let role = role_claim(payload.get("role"));
    let tenant_id = first_scalar(&payload, &TENANT_CLAIMS);
    let expires_at = payload.get("exp").and_then(timestamp_claim);

    Ok(TokenClaims { id, email, role, tenant_id, expires_at })
}

/// Decode the raw JSON payload of a token without interpreting it.
///
/// # Errors
/// Returns a [`DecodeError`] if the token is structurally invalid or the
/// payload is not a JSON object.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, DecodeError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(DecodeError::SegmentCount(parts.len()));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|err| DecodeError::Base64(err.to_string()))?;
    let payload_str = String::from_utf8(payload_bytes).map_err(|_| DecodeError::Utf8)?;

    match serde_json::from_str::<Value>(&payload_str) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeError::NotAnObject),
        Err(err) => Err(DecodeError::Json(err.to_string())),
    }
}

fn first_scalar(payload: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().filter_map(|name| payload.get(*name)).find_map(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn role_claim(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => "operator",
            Some(2) => "manager",
            Some(3) => "admin",
            _ => "citizen",
        }
        .to_string(),
        _ => "citizen".to_string(),
    }
}

fn timestamp_claim(value: &Value) -> Option<DateTime<Utc>> {
    #[allow(clippy::cast_possible_truncation)]
    let secs = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
    Utc.timestamp_opt(secs, 0).single()
}
