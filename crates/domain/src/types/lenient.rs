//! Deserializers for fields the backend sends as either a number or a string

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a scalar JSON identifier as a string.
///
/// Strings are trimmed; integral numbers are printed without a fraction.
/// Empty strings, `null` and non-scalar values yield `None`.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `Option<String>` field that also accepts numbers.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// Required `String` field that also accepts numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or number, got {value}")))
}
