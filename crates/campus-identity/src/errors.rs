//! Identity-provider error types.

/// Errors that can occur talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Sign-in was rejected for bad credentials. Never retried.
    #[error("invalid credentials: {message}")]
    InvalidCredentials {
        /// Provider rejection reason (e.g. `INVALID_PASSWORD`).
        message: String,
    },

    /// The provider endpoint returned a non-success status.
    #[error("identity endpoint error ({status}): {message}")]
    Endpoint {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// An operation requiring a session was invoked without one.
    #[error("no active identity session")]
    NoSession,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_display() {
        let err = IdentityError::InvalidCredentials {
            message: "INVALID_PASSWORD".to_string(),
        };
        assert_eq!(err.to_string(), "invalid credentials: INVALID_PASSWORD");
    }

    #[test]
    fn endpoint_display() {
        let err = IdentityError::Endpoint {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "identity endpoint error (503): unavailable");
    }

    #[test]
    fn no_session_display() {
        assert_eq!(
            IdentityError::NoSession.to_string(),
            "no active identity session"
        );
    }
}
