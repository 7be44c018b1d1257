//! Token fixtures
//!
//! Unsigned JWTs with arbitrary payloads. The client never verifies
//! signatures, so a constant signature segment is enough.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

const FIXTURE_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Build a three-segment token whose payload is `claims`.
///
/// # Examples
///
/// ```
/// use civicreport_common::auth::decode_claims;
/// use civicreport_common::testing::fake_jwt;
///
/// let token = fake_jwt(&serde_json::json!({ "sub": "42", "role": 3 }));
/// assert_eq!(decode_claims(&token).unwrap().role, "admin");
/// ```
#[must_use]
pub fn fake_jwt(claims: &Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(FIXTURE_HEADER),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode("fixture-signature")
    )
}

/// Token for `id` with the given raw `role` claim and optional tenant.
#[must_use]
pub fn jwt_for(id: &str, email: &str, role: Value, tenant_id: Option<&str>) -> String {
    let mut claims = json!({ "id": id, "email": email, "role": role });
    if let Some(tenant) = tenant_id {
        claims["tenantId"] = json!(tenant);
    }
    fake_jwt(&claims)
}
