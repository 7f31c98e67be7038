//! Backend profile endpoint client.
//!
//! `GET <profile-endpoint>` with `Authorization: Bearer <token>`. Non-2xx
//! responses are parsed once here into the typed error envelope; the
//! underlying HTTP client carries an explicit per-request timeout.

use std::time::Duration;

use tracing::debug;

use campus_core::{ErrorEnvelope, ProfilePayload};
use campus_settings::BackendSettings;

use crate::errors::SessionError;

/// HTTP client for the backend profile endpoint.
pub struct ProfileClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ProfileClient {
    /// Build a client from backend settings.
    ///
    /// The configured `timeout_ms` is applied per request, so the bound
    /// holds regardless of how the client was constructed; transport
    /// failures (including timeouts) surface as `ProfileFetch` with
    /// status 0.
    #[must_use]
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!(
                "{}{}",
                settings.base_url.trim_end_matches('/'),
                settings.profile_path
            ),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    /// Fetch the raw profile payload for the given bearer token.
    #[tracing::instrument(skip_all)]
    pub async fn fetch(&self, token: &str) -> Result<ProfilePayload, SessionError> {
        debug!(url = %self.url, "fetching profile");
        let resp = self
            .client
            .get(&self.url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SessionError::ProfileFetch {
                status: 0,
                message: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| SessionError::ProfileFetch {
            status,
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            let envelope = ErrorEnvelope::parse(&body);
            return Err(SessionError::ProfileFetch {
                status,
                message: envelope.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|e| SessionError::ProfileFetch {
            status,
            message: format!("malformed profile body: {e}"),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
