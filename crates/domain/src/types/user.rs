//! User profile types
//!
//! [`User`] is the canonical profile the client exposes and caches under the
//! `user` storage key. [`ProfilePayload`] is the loosely-typed shape the
//! server returns from `GET /user/:id` and inside login responses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient::{opt_string_or_number, string_or_number};
use super::role::Role;

/// Canonical user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "role_from_any")]
    pub role: Role,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl User {
    /// Profile carrying only identity fields.
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            tenant_id: None,
            name: None,
            surname: None,
            phone: None,
            birth_date: None,
        }
    }

    /// "Name Surname", whichever parts are present, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Profile as sent by the server
///
/// Every field is optional. Role and tenant are kept for completeness but the
/// session never trusts them over token claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    #[serde(default, deserialize_with = "opt_string_or_number", alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default, deserialize_with = "opt_string_or_number", alias = "tenant_id")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "birth_date")]
    pub birth_date: Option<String>,
}

impl ProfilePayload {
    /// Parse a profile body that is either bare or wrapped as `{"user": {...}}`.
    ///
    /// Returns `None` when the value is not an object.
    #[must_use]
    pub fn from_response(value: Value) -> Option<Self> {
        let inner = match value {
            Value::Object(mut map) => match map.remove("user") {
                Some(user @ Value::Object(_)) => user,
                Some(_) | None => Value::Object(map),
            },
            _ => return None,
        };
        serde_json::from_value(inner).ok()
    }
}

impl From<&User> for ProfilePayload {
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.id.clone()),
            email: Some(user.email.clone()),
            role: Some(Value::String(user.role.to_string())),
            tenant_id: user.tenant_id.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date.clone(),
        }
    }
}

fn role_from_any<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Role::normalize(&value))
}
