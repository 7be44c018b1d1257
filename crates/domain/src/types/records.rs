//! Server-owned records
//!
//! Tickets, replies, assignments and tenants are fetched and displayed as-is.
//! The fields screens render are typed; everything else survives in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient::{opt_string_or_number, string_or_number};

/// A civic issue report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message in a ticket's thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operator assignment returned by `POST /tickets/:id/assign`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub ticket_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub operator_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A municipality using the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /tickets` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Photo references produced by the image picker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

/// `POST /tickets/:id/replies` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub message: String,
}

/// `POST /tickets/:id/assign` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub operator_id: String,
}

/// Extract a list from a body that is either a bare array or an object
/// wrapping the array under `key`.
///
/// # Errors
/// Returns the serde error when the items do not match `T`.
pub fn list_from_response<T>(value: Value, key: &str) -> Result<Vec<T>, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
{
    let items = match value {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(items)
}
