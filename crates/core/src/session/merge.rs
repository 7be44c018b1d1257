//! Profile merge rules
//!
//! A user profile is assembled from three sources:
//! - the server profile, when a fetch succeeded
//! - the claims of the current access token
//! - the profile cached on the device
//!
//! Role and tenant always come from the token claims. Identity fields prefer
//! the server, then the claims, then the cache. Descriptive fields prefer the
//! server, then the cache. A cached profile for a different subject is
//! ignored entirely.

use civicreport_common::auth::TokenClaims;
use civicreport_domain::{ProfilePayload, Role, User};

/// Build the canonical user from the available sources.
#[must_use]
pub fn merge_user(
    server: Option<&ProfilePayload>,
    claims: &TokenClaims,
    cached: Option<&User>,
) -> User {
    let cached = cached.filter(|user| user.id == claims.id);

    let id = server
        .and_then(|p| non_empty(p.id.as_deref()))
        .unwrap_or_else(|| claims.id.clone());

    let email = server
        .and_then(|p| non_empty(p.email.as_deref()))
        .or_else(|| non_empty(Some(claims.email.as_str())))
        .or_else(|| cached.and_then(|u| non_empty(Some(u.email.as_str()))))
        .unwrap_or_default();

    User {
        id,
        email,
        role: Role::from_claim_str(&claims.role),
        tenant_id: claims.tenant_id.clone(),
        name: prefer(server.and_then(|p| p.name.as_deref()), cached.and_then(|u| u.name.as_deref())),
        surname: prefer(
            server.and_then(|p| p.surname.as_deref()),
            cached.and_then(|u| u.surname.as_deref()),
        ),
        phone: prefer(
            server.and_then(|p| p.phone.as_deref()),
            cached.and_then(|u| u.phone.as_deref()),
        ),
        birth_date: prefer(
            server.and_then(|p| p.birth_date.as_deref()),
            cached.and_then(|u| u.birth_date.as_deref()),
        ),
    }
}

fn prefer(server: Option<&str>, cached: Option<&str>) -> Option<String> {
    non_empty(server).or_else(|| non_empty(cached))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
