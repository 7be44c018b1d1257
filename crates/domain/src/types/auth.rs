//! Wire types for the authentication endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /login` body
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /login` response
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// Access token of an accepted login.
    ///
    /// A login is accepted when a non-empty token is present and the server
    /// did not explicitly report `success: false`.
    #[must_use]
    pub fn accepted_token(&self) -> Option<&str> {
        if self.success == Some(false) {
            return None;
        }
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("success", &self.success)
            .field("has_token", &self.token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// `POST /register` body
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

impl RegisterRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into(), ..Self::default() }
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .finish_non_exhaustive()
    }
}

/// `POST /register` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Refresh endpoint body
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh endpoint response
///
/// Some deployments name the new access token `token`, others `accessToken`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    /// The rotated access token under whichever name the server used.
    #[must_use]
    pub fn new_access_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn login_acceptance_rules() {
        let ok: LoginResponse =
            serde_json::from_value(json!({ "success": true, "token": "abc" })).unwrap();
        assert_eq!(ok.accepted_token(), Some("abc"));

        let implicit: LoginResponse = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        assert_eq!(implicit.accepted_token(), Some("abc"));

        let refused: LoginResponse = serde_json::from_value(
            json!({ "success": false, "token": "abc", "message": "bad credentials" }),
        )
        .unwrap();
        assert_eq!(refused.accepted_token(), None);

        let empty: LoginResponse =
            serde_json::from_value(json!({ "success": true, "token": "" })).unwrap();
        assert_eq!(empty.accepted_token(), None);
    }

    #[test]
    fn register_request_omits_missing_fields() {
        let mut req = RegisterRequest::new("a@x.com", "pw");
        req.birth_date = Some("1990-05-01".into());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({ "email": "a@x.com", "password": "pw", "birthDate": "1990-05-01" }));
    }

    #[test]
    fn refresh_response_accepts_both_names() {
        let a: RefreshResponse = serde_json::from_value(json!({ "token": "n1" })).unwrap();
        assert_eq!(a.new_access_token(), Some("n1"));
        let b: RefreshResponse =
            serde_json::from_value(json!({ "accessToken": "n2", "refreshToken": "r2" })).unwrap();
        assert_eq!(b.new_access_token(), Some("n2"));
        assert_eq!(b.refresh_token.as_deref(), Some("r2"));
        let none: RefreshResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(none.new_access_token(), None);
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let req = LoginRequest { email: "a@x.com".into(), password: "hunter2".into() };
        assert!(!format!("{req:?}").contains("hunter2"));
        let resp = LoginResponse { token: Some("secret-jwt".into()), ..LoginResponse::default() };
        assert!(!format!("{resp:?}").contains("secret-jwt"));
    }
}
