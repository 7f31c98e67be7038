//! User profile payloads and invariant validation.
//!
//! The backend profile endpoint returns a [`ProfilePayload`] (raw wire
//! shape, role as a plain string). [`validate_profile`] turns it into an
//! immutable [`UserProfile`] snapshot, enforcing:
//!
//! - the role whitelist (an unrecognized role is an inconsistent state, not
//!   something to silently accept)
//! - the district affiliation required by `district-admin` / `school-admin`
//!
//! A missing district is the one recoverable violation: the session manager
//! retries it once with a forced token mint before giving up.

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Raw profile body from the backend profile endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    /// Application user ID.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Role as sent over the wire (validated against the whitelist later).
    pub role: String,
    /// Owning district, when the role is district-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,
    /// Owning school, when the role is school-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    /// Account status (e.g. `"active"`, `"suspended"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Validated, immutable user profile snapshot.
///
/// Only produced by [`validate_profile`]; holding one implies the role is
/// one of the five whitelisted roles and any district requirement is met.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Application user ID.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Validated role.
    pub role: Role,
    /// Owning district (present for district-scoped roles).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,
    /// Owning school.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    /// Account status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A profile shape that violates the role/district invariants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// The role is outside the whitelist. Never retried.
    #[error("unrecognized role: {role:?}")]
    UnknownRole {
        /// The offending wire role string.
        role: String,
    },
    /// A district-scoped role arrived without a `districtId`.
    #[error("{role} profile is missing districtId")]
    MissingDistrict {
        /// The district-scoped role.
        role: Role,
    },
}

impl InvariantViolation {
    /// Whether the session manager may recover by re-minting the token and
    /// refetching the profile once.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingDistrict { .. })
    }
}

/// Validate a raw payload into a [`UserProfile`].
pub fn validate_profile(payload: ProfilePayload) -> Result<UserProfile, InvariantViolation> {
    let Some(role) = Role::parse(&payload.role) else {
        return Err(InvariantViolation::UnknownRole { role: payload.role });
    };

    if role.requires_district() && payload.district_id.is_none() {
        return Err(InvariantViolation::MissingDistrict { role });
    }

    Ok(UserProfile {
        id: payload.id,
        email: payload.email,
        display_name: payload.display_name,
        role,
        district_id: payload.district_id,
        school_id: payload.school_id,
        status: payload.status,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
