//! The five-role tenancy model.
//!
//! Roles arrive over the wire as strings. Deserializing an unrecognized role
//! must surface as an invariant violation rather than a decode failure, so
//! the raw payload keeps the string and [`Role::parse`] is applied during
//! validation.

use serde::{Deserialize, Serialize};

/// Application role of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Platform operator; not bound to any district.
    SuperAdmin,
    /// Administers a single district.
    DistrictAdmin,
    /// Administers a single school within a district.
    SchoolAdmin,
    /// Classroom teacher.
    Teacher,
    /// Enrolled student.
    Student,
}

impl Role {
    /// Parse a wire role string. Returns `None` for anything outside the
    /// whitelist.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super-admin" => Some(Self::SuperAdmin),
            "district-admin" => Some(Self::DistrictAdmin),
            "school-admin" => Some(Self::SchoolAdmin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    /// Whether a profile with this role must carry a `districtId`.
    ///
    /// `super-admin`, `teacher`, and `student` are district-agnostic.
    #[must_use]
    pub const fn requires_district(self) -> bool {
        matches!(self, Self::DistrictAdmin | Self::SchoolAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super-admin"),
            Self::DistrictAdmin => write!(f, "district-admin"),
            Self::SchoolAdmin => write!(f, "school-admin"),
            Self::Teacher => write!(f, "teacher"),
            Self::Student => write!(f, "student"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
