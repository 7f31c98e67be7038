//! # campus-core
//!
//! Foundation types for the Campus school-administration dashboard:
//!
//! - **Roles**: the five-role tenancy model (`super-admin` through `student`)
//! - **Profiles**: raw wire payloads and validated [`UserProfile`] snapshots
//! - **Invariants**: role whitelist and district-affiliation checks
//! - **Error envelope**: the typed `{code, message, details}` backend error body
//! - **Logging**: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod envelope;
pub mod logging;
pub mod profile;
pub mod roles;

pub use envelope::ErrorEnvelope;
pub use profile::{InvariantViolation, ProfilePayload, UserProfile, validate_profile};
pub use roles::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
