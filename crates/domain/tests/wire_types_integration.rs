//! Integration tests for wire and cache types
//!
//! Payloads below are shaped like real backend responses, including the
//! inconsistencies the client has to live with.

use civicreport_domain::{
    list_from_response, LoginResponse, ProfilePayload, Role, SessionSnapshot, Ticket, User,
};
use serde_json::json;

#[test]
fn test_login_response_with_embedded_profile() {
    let response: LoginResponse = serde_json::from_value(json!({
        "success": true,
        "token": "h.p.s",
        "user": { "name": "Anna", "surname": "Verdi", "role": 2 }
    }))
    .unwrap();

    assert_eq!(response.accepted_token(), Some("h.p.s"));
    assert!(response.refresh_token.is_none());

    let profile = ProfilePayload::from_response(response.user.unwrap()).unwrap();
    assert_eq!(profile.name.as_deref(), Some("Anna"));
    assert!(profile.id.is_none());
    assert_eq!(profile.role.as_ref().map(Role::normalize), Some(Role::Manager));
}

#[test]
fn test_cached_user_survives_restart_shape() {
    let mut user = User::new("42", "op@city.example", Role::Operator);
    user.tenant_id = Some("milano".into());
    user.phone = Some("+39 02 000".into());

    let stored = serde_json::to_string(&user).unwrap();
    let restored: User = serde_json::from_str(&stored).unwrap();
    assert_eq!(restored, user);

    let snapshot = SessionSnapshot::authenticated(restored, 1);
    assert_eq!(snapshot.role(), Some(Role::Operator));
    assert_eq!(snapshot.tenant_id(), Some("milano"));
}

#[test]
fn test_ticket_list_from_wrapped_response() {
    let tickets: Vec<Ticket> = list_from_response(
        json!({
            "tickets": [
                { "id": 1, "title": "Graffiti", "status": "open", "votes": 3 },
                { "id": "2", "title": "Street light", "status": "assigned" }
            ],
            "page": 1
        }),
        "tickets",
    )
    .unwrap();

    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0].id, "1");
    assert_eq!(tickets[0].extra["votes"], json!(3));
    assert_eq!(tickets[1].status.as_deref(), Some("assigned"));
}
