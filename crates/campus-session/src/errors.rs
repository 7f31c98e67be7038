//! Session error taxonomy.
//!
//! Propagation policy:
//! - [`SessionError::Credential`] and [`SessionError::NoSession`] bubble
//!   immediately to the caller
//! - [`SessionError::TokenMint`] / [`SessionError::ProfileFetch`] are
//!   retryable within the manager's bounded fetch loop
//! - [`SessionError::Invariant`] is never retried beyond the single
//!   forced-mint recovery for a missing district

use campus_core::profile::InvariantViolation;
use campus_identity::IdentityError;

/// Errors surfaced by the session manager.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Sign-in rejected for bad credentials. Never retried.
    #[error("credential error: {message}")]
    Credential {
        /// Provider rejection reason.
        message: String,
    },

    /// The identity provider could not produce a token (or a session).
    #[error("token mint failed: {message}")]
    TokenMint {
        /// Provider failure description.
        message: String,
    },

    /// The backend rejected or failed the profile fetch.
    #[error("profile fetch failed ({status}): {message}")]
    ProfileFetch {
        /// HTTP status code (0 for transport-level failures).
        status: u16,
        /// Parsed error-envelope text or transport error.
        message: String,
    },

    /// The fetched profile violates the role/district invariants.
    #[error("profile invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    /// An operation requiring a session was invoked without one.
    #[error("no active identity session")]
    NoSession,
}

impl SessionError {
    /// Whether the bounded fetch loop may retry after this error.
    pub(crate) const fn is_retryable(&self) -> bool {
        matches!(self, Self::TokenMint { .. } | Self::ProfileFetch { .. })
    }
}

impl From<IdentityError> for SessionError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials { message } => Self::Credential { message },
            IdentityError::NoSession => Self::NoSession,
            other => Self::TokenMint {
                message: other.to_string(),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
