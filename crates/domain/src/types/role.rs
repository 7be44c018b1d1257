//! Canonical user roles
//!
//! The backend is inconsistent about how it represents a role: token claims
//! carry either a lowercase name or a small integer, profile payloads
//! sometimes carry the integer as a string, and casing varies. Every caller
//! goes through [`Role::normalize`] instead of carrying its own table.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_domain_status_conversions;

/// Access level of a user within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Files and follows tickets
    #[default]
    Citizen,
    /// Triages and works tickets for a tenant
    Operator,
    /// Assigns tickets to operators
    Manager,
    /// Administers the tenant
    Admin,
}

impl_domain_status_conversions!(Role {
    Citizen => "citizen",
    Operator => "operator",
    Manager => "manager",
    Admin => "admin",
});

impl Role {
    /// Map the backend's numeric role code.
    ///
    /// 1 → operator, 2 → manager, 3 → admin, anything else → citizen.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Operator,
            2 => Self::Manager,
            3 => Self::Admin,
            _ => Self::Citizen,
        }
    }

    /// Normalize a role given as text: a role name in any casing or a
    /// numeric string. Unrecognized input is a citizen.
    #[must_use]
    pub fn from_claim_str(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }
        trimmed.parse().unwrap_or_default()
    }

    /// Normalize any JSON role representation.
    ///
    /// Accepts strings (names or numeric strings) and numbers. Floats are
    /// only honored when integral. Everything else, including `null` and a
    /// missing claim, is a citizen.
    #[must_use]
    pub fn normalize(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::from_claim_str(s),
            Value::Number(n) => match n.as_i64() {
                Some(code) => Self::from_code(code),
                None => n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map_or(Self::Citizen, |f| Self::from_code(f as i64)),
            },
            _ => Self::Citizen,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_codes_map_to_staff_roles() {
        assert_eq!(Role::normalize(&json!(1)), Role::Operator);
        assert_eq!(Role::normalize(&json!(2)), Role::Manager);
        assert_eq!(Role::normalize(&json!(3)), Role::Admin);
        assert_eq!(Role::normalize(&json!(0)), Role::Citizen);
        assert_eq!(Role::normalize(&json!(4)), Role::Citizen);
        assert_eq!(Role::normalize(&json!(-1)), Role::Citizen);
    }

    #[test]
    fn numeric_strings_agree_with_numbers() {
        for code in 0..6 {
            assert_eq!(
                Role::normalize(&json!(code.to_string())),
                Role::normalize(&json!(code)),
                "code {code}"
            );
        }
        assert_eq!(Role::normalize(&json!(" 2 ")), Role::Manager);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Role::normalize(&json!("ADMIN")), Role::Admin);
        assert_eq!(Role::normalize(&json!("Operator")), Role::Operator);
        assert_eq!(Role::normalize(&json!("manager")), Role::Manager);
        assert_eq!(Role::normalize(&json!("citizen")), Role::Citizen);
    }

    #[test]
    fn unrecognized_input_defaults_to_citizen() {
        assert_eq!(Role::normalize(&json!("supervisor")), Role::Citizen);
        assert_eq!(Role::normalize(&json!("")), Role::Citizen);
        assert_eq!(Role::normalize(&Value::Null), Role::Citizen);
        assert_eq!(Role::normalize(&json!(true)), Role::Citizen);
        assert_eq!(Role::normalize(&json!(["admin"])), Role::Citizen);
        assert_eq!(Role::normalize(&json!(2.5)), Role::Citizen);
        assert_eq!(Role::normalize(&json!(2.0)), Role::Manager);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_value(Role::Manager).unwrap(), json!("manager"));
        let parsed: Role = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
