//! Typed backend error envelope.
//!
//! The backend contract returns errors as `{code, message, details}`. The
//! envelope is parsed exactly once, at the API-client boundary, and mapped
//! into the session error taxonomy there. Legacy or malformed bodies
//! degrade to an `unknown` code carrying the raw text.

use serde::{Deserialize, Serialize};

/// Code used when a body does not carry a recognizable envelope.
pub const UNKNOWN_CODE: &str = "unknown";

/// Structured error body from the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Machine-readable error code (e.g. `"district_not_found"`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Parse a response body into an envelope, tolerating anything.
    ///
    /// - a well-formed envelope is returned as-is
    /// - a JSON object with only a `message` field keeps that message
    /// - everything else becomes an `unknown` envelope wrapping the raw body
    #[must_use]
    pub fn parse(body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<Self>(body) {
            return envelope;
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
                return Self {
                    code: UNKNOWN_CODE.to_string(),
                    message: message.to_string(),
                    details: None,
                };
            }
        }

        let trimmed = body.trim();
        Self {
            code: UNKNOWN_CODE.to_string(),
            message: if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.to_string()
            },
            details: None,
        }
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
