//! Session state exposed to the UI

use serde::{Deserialize, Serialize};

use super::role::Role;
use super::user::User;
use crate::impl_domain_status_conversions;

/// Lifecycle state of the client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Persisted state has not been read yet
    #[default]
    Loading,
    Authenticated,
    Anonymous,
}

impl_domain_status_conversions!(SessionStatus {
    Loading => "loading",
    Authenticated => "authenticated",
    Anonymous => "anonymous",
});

/// Read-only view of the session published to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<User>,
    /// Session epoch the snapshot was taken in
    pub epoch: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn anonymous(epoch: u64) -> Self {
        Self { status: SessionStatus::Anonymous, user: None, epoch }
    }

    #[must_use]
    pub fn authenticated(user: User, epoch: u64) -> Self {
        Self { status: SessionStatus::Authenticated, user: Some(user), epoch }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Role of the signed-in user, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    /// Tenant of the signed-in user, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.tenant_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_loading() {
        let snapshot = SessionSnapshot::loading();
        assert_eq!(snapshot.status, SessionStatus::Loading);
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.epoch, 0);
    }

    #[test]
    fn authenticated_snapshot_exposes_role_and_tenant() {
        let mut user = User::new("1", "a@x.com", Role::Operator);
        user.tenant_id = Some("rome".into());
        let snapshot = SessionSnapshot::authenticated(user, 3);
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.role(), Some(Role::Operator));
        assert_eq!(snapshot.tenant_id(), Some("rome"));
        assert_eq!(snapshot.status.to_string(), "authenticated");
    }
}
