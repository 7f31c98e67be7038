//! Session lifecycle states and read-only snapshots.

use serde::{Deserialize, Serialize};

use campus_core::UserProfile;

/// Lifecycle state of the managed session.
///
/// `Initializing → {Unauthenticated, Authenticating, Authenticated, Error}`;
/// the machine is long-lived and re-enterable, with no terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    /// Startup; the identity provider has not yet reported session presence.
    Initializing,
    /// No identity session.
    Unauthenticated,
    /// Session present; token mint / profile fetch in flight.
    Authenticating,
    /// Token and validated profile available.
    Authenticated,
    /// An unrecovered mint/fetch/invariant failure; UI redirects to login.
    Error,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Read-only view of the session handed to subscribers.
///
/// `state == Authenticated` implies both `token` and `profile` are present;
/// the manager's single commit point enforces this.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// Current bearer token, when authenticated.
    pub token: Option<String>,
    /// Validated profile, when authenticated.
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    /// Startup snapshot.
    #[must_use]
    pub const fn initializing() -> Self {
        Self {
            state: LifecycleState::Initializing,
            token: None,
            profile: None,
        }
    }

    /// Snapshot with all session fields cleared.
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            state: LifecycleState::Unauthenticated,
            token: None,
            profile: None,
        }
    }

    /// In-flight snapshot while minting/fetching.
    #[must_use]
    pub const fn authenticating() -> Self {
        Self {
            state: LifecycleState::Authenticating,
            token: None,
            profile: None,
        }
    }

    /// Committed authenticated snapshot.
    #[must_use]
    pub const fn authenticated(token: String, profile: UserProfile) -> Self {
        Self {
            state: LifecycleState::Authenticated,
            token: Some(token),
            profile: Some(profile),
        }
    }

    /// Failure snapshot; session fields cleared.
    #[must_use]
    pub const fn error() -> Self {
        Self {
            state: LifecycleState::Error,
            token: None,
            profile: None,
        }
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == LifecycleState::Authenticated
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::{Role, validate_profile};

    fn profile() -> UserProfile {
        validate_profile(campus_core::ProfilePayload {
            id: "u1".into(),
            email: "a@b.com".into(),
            display_name: "A".into(),
            role: "teacher".into(),
            district_id: None,
            school_id: None,
            status: None,
        })
        .unwrap()
    }

    #[test]
    fn cleared_snapshots_have_no_fields() {
        for snap in [
            SessionSnapshot::initializing(),
            SessionSnapshot::unauthenticated(),
            SessionSnapshot::authenticating(),
            SessionSnapshot::error(),
        ] {
            assert!(snap.token.is_none());
            assert!(snap.profile.is_none());
            assert!(!snap.is_authenticated());
        }
    }

    #[test]
    fn authenticated_snapshot_carries_both_fields() {
        let snap = SessionSnapshot::authenticated("tok1".into(), profile());
        assert!(snap.is_authenticated());
        assert_eq!(snap.token.as_deref(), Some("tok1"));
        assert_eq!(snap.profile.unwrap().role, Role::Teacher);
    }

    #[test]
    fn lifecycle_state_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&LifecycleState::Unauthenticated).unwrap(),
            "\"unauthenticated\""
        );
        let back: LifecycleState = serde_json::from_str("\"authenticating\"").unwrap();
        assert_eq!(back, LifecycleState::Authenticating);
    }

    #[test]
    fn lifecycle_state_display() {
        assert_eq!(LifecycleState::Authenticated.to_string(), "authenticated");
        assert_eq!(LifecycleState::Error.to_string(), "error");
    }
}
