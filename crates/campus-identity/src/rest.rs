//! REST identity-toolkit provider.
//!
//! Speaks the identity-toolkit wire protocol: account operations
//! (`accounts:signInWithPassword`, `accounts:signUp`) against the base URL
//! and refresh-token exchange against the token URL, both keyed by a public
//! API key query parameter.
//!
//! The provider caches the current ID token and re-mints it through the
//! token endpoint when it is stale (expiry buffer) or when a forced refresh
//! is requested.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use campus_settings::IdentitySettings;

use crate::errors::IdentityError;
use crate::provider::{IdentityEvent, IdentityProvider};

/// Capacity of the session-change broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Fallback token lifetime when the provider omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Provider rejection codes that mean "bad credentials" (never retried).
const CREDENTIAL_CODES: &[&str] = &[
    "INVALID_PASSWORD",
    "EMAIL_NOT_FOUND",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
    "USER_DISABLED",
    "EMAIL_EXISTS",
];

/// Cached provider session.
#[derive(Clone, Debug)]
struct CachedSession {
    uid: String,
    id_token: String,
    refresh_token: String,
    /// Epoch milliseconds at which `id_token` expires.
    expires_at: i64,
}

/// Identity provider backed by a REST identity toolkit.
pub struct RestIdentityProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    token_url: String,
    expiry_buffer_ms: i64,
    session: parking_lot::Mutex<Option<CachedSession>>,
    events: broadcast::Sender<IdentityEvent>,
}

impl RestIdentityProvider {
    /// Create a provider from identity settings.
    #[must_use]
    pub fn new(settings: &IdentitySettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token_url: settings.token_url.trim_end_matches('/').to_string(),
            expiry_buffer_ms: settings.token_expiry_buffer_seconds * 1000,
            session: parking_lot::Mutex::new(None),
            events,
        }
    }

    /// Provider user ID of the current session, if any.
    #[must_use]
    pub fn uid(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.uid.clone())
    }

    fn account_url(&self, operation: &str) -> String {
        format!(
            "{}/v1/accounts:{operation}?key={}",
            self.base_url, self.api_key
        )
    }

    /// Store a freshly established session and notify subscribers.
    fn establish(&self, data: AccountResponse) {
        let uid = data.local_id.clone();
        let session = CachedSession {
            uid: data.local_id,
            id_token: data.id_token,
            refresh_token: data.refresh_token,
            expires_at: now_ms() + parse_expires_in(data.expires_in.as_deref()) * 1000,
        };
        *self.session.lock() = Some(session);
        let _ = self.events.send(IdentityEvent::SessionEstablished { uid });
    }

    async fn post_account_operation(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<AccountResponse, IdentityError> {
        let resp = self
            .client
            .post(self.account_url(operation))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_endpoint_error(status, &text));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    #[tracing::instrument(skip_all)]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), IdentityError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let data = self
            .post_account_operation("signInWithPassword", body)
            .await?;
        info!(uid = %data.local_id, "identity session established");
        self.establish(data);
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(), IdentityError> {
        let mut body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        if let Some(name) = display_name {
            body["displayName"] = serde_json::Value::String(name.to_string());
        }
        let data = self.post_account_operation("signUp", body).await?;
        info!(uid = %data.local_id, "identity account created");
        self.establish(data);
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn sign_out(&self) -> Result<(), IdentityError> {
        let had_session = self.session.lock().take().is_some();
        if had_session {
            let _ = self.events.send(IdentityEvent::SessionEnded);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(force = force_refresh))]
    async fn mint_token(&self, force_refresh: bool) -> Result<String, IdentityError> {
        let refresh_token = {
            let guard = self.session.lock();
            let Some(session) = guard.as_ref() else {
                return Err(IdentityError::NoSession);
            };
            if !force_refresh && now_ms() + self.expiry_buffer_ms < session.expires_at {
                return Ok(session.id_token.clone());
            }
            session.refresh_token.clone()
        };

        debug!("minting fresh identity token");
        let url = format!("{}/v1/token?key={}", self.token_url, self.api_key);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, "token mint failed");
            return Err(classify_endpoint_error(status, &text));
        }

        let data: TokenResponse = resp.json().await?;
        let expires_at = now_ms() + parse_expires_in(data.expires_in.as_deref()) * 1000;

        // A sign-out may have raced the mint; never resurrect the session.
        let mut guard = self.session.lock();
        if let Some(session) = guard.as_mut() {
            session.id_token = data.id_token.clone();
            session.refresh_token = data.refresh_token;
            session.expires_at = expires_at;
        }
        Ok(data.id_token)
    }

    fn has_session(&self) -> bool {
        self.session.lock().is_some()
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }
}

/// Classify a non-success identity endpoint response.
///
/// Credential rejections become [`IdentityError::InvalidCredentials`];
/// everything else keeps the status and message.
fn classify_endpoint_error(status: u16, body: &str) -> IdentityError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if CREDENTIAL_CODES.iter().any(|code| message.starts_with(code)) {
        IdentityError::InvalidCredentials { message }
    } else {
        IdentityError::Endpoint { status, message }
    }
}

/// Parse the provider's `expiresIn` field (seconds, sent as a string).
fn parse_expires_in(value: Option<&str>) -> i64 {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

/// Current time in milliseconds since epoch.
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Account-operation response (sign-in / sign-up).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

/// Token-endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_settings(server: &MockServer) -> IdentitySettings {
        IdentitySettings {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            token_url: server.uri(),
            token_expiry_buffer_seconds: 300,
        }
    }

    fn sign_in_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "localId": "uid-1",
            "email": "a@b.com",
            "idToken": token,
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })
    }

    async fn mount_sign_in(server: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body(token)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sign_in_establishes_session_and_emits_event() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "tok1").await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        let mut events = provider.subscribe();

        provider
            .sign_in_with_password("a@b.com", "pw")
            .await
            .unwrap();

        assert!(provider.has_session());
        assert_eq!(provider.uid().as_deref(), Some("uid-1"));
        assert_eq!(
            events.recv().await.unwrap(),
            IdentityEvent::SessionEstablished {
                uid: "uid-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn sign_in_bad_password_is_credential_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_PASSWORD"}
            })))
            .mount(&server)
            .await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        let err = provider
            .sign_in_with_password("a@b.com", "nope")
            .await
            .unwrap_err();

        assert_matches!(err, IdentityError::InvalidCredentials { ref message } if message == "INVALID_PASSWORD");
        assert!(!provider.has_session());
    }

    #[tokio::test]
    async fn sign_up_forwards_display_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .and(body_partial_json(serde_json::json!({
                "email": "new@b.com",
                "displayName": "New Teacher"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body("tok-new")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        provider
            .sign_up("new@b.com", "pw", Some("New Teacher"))
            .await
            .unwrap();
        assert!(provider.has_session());
    }

    #[tokio::test]
    async fn mint_token_without_session_fails() {
        let server = MockServer::start().await;
        let provider = RestIdentityProvider::new(&test_settings(&server));
        let err = provider.mint_token(false).await.unwrap_err();
        assert_matches!(err, IdentityError::NoSession);
    }

    #[tokio::test]
    async fn mint_token_returns_cached_token_while_fresh() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "tok1").await;
        // No token endpoint mounted: a mint request would 404

        let provider = RestIdentityProvider::new(&test_settings(&server));
        provider
            .sign_in_with_password("a@b.com", "pw")
            .await
            .unwrap();

        let token = provider.mint_token(false).await.unwrap();
        assert_eq!(token, "tok1");
    }

    #[tokio::test]
    async fn mint_token_force_hits_token_endpoint() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "tok1").await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id_token": "tok2",
                "refresh_token": "refresh-2",
                "expires_in": "3600",
                "user_id": "uid-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        provider
            .sign_in_with_password("a@b.com", "pw")
            .await
            .unwrap();

        let token = provider.mint_token(true).await.unwrap();
        assert_eq!(token, "tok2");

        // The re-minted token is now the cached one
        let token = provider.mint_token(false).await.unwrap();
        assert_eq!(token, "tok2");
    }

    #[tokio::test]
    async fn mint_token_endpoint_failure_surfaces_status() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "tok1").await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("mint exploded"))
            .mount(&server)
            .await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        provider
            .sign_in_with_password("a@b.com", "pw")
            .await
            .unwrap();

        let err = provider.mint_token(true).await.unwrap_err();
        assert_matches!(err, IdentityError::Endpoint { status: 500, .. });
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_emits_event() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "tok1").await;

        let provider = RestIdentityProvider::new(&test_settings(&server));
        provider
            .sign_in_with_password("a@b.com", "pw")
            .await
            .unwrap();
        let mut events = provider.subscribe();

        provider.sign_out().await.unwrap();
        assert!(!provider.has_session());
        assert_eq!(events.recv().await.unwrap(), IdentityEvent::SessionEnded);

        // Second sign-out is a no-op and emits nothing further
        provider.sign_out().await.unwrap();
        assert!(events.try_recv().is_err());
    }

    // ── classify_endpoint_error ─────────────────────────────────────

    #[test]
    fn classify_credential_codes() {
        for code in CREDENTIAL_CODES {
            let body = format!(r#"{{"error":{{"message":"{code}"}}}}"#);
            assert_matches!(
                classify_endpoint_error(400, &body),
                IdentityError::InvalidCredentials { .. }
            );
        }
    }

    #[test]
    fn classify_credential_code_with_suffix() {
        let body = r#"{"error":{"message":"INVALID_PASSWORD : too many attempts"}}"#;
        assert_matches!(
            classify_endpoint_error(400, body),
            IdentityError::InvalidCredentials { .. }
        );
    }

    #[test]
    fn classify_other_errors_keep_status() {
        let err = classify_endpoint_error(503, "Service Unavailable");
        assert_matches!(err, IdentityError::Endpoint { status: 503, ref message } if message == "Service Unavailable");
    }

    // ── parse_expires_in ────────────────────────────────────────────

    #[test]
    fn expires_in_parses_seconds() {
        assert_eq!(parse_expires_in(Some("3600")), 3600);
        assert_eq!(parse_expires_in(Some("60")), 60);
    }

    #[test]
    fn expires_in_falls_back_to_default() {
        assert_eq!(parse_expires_in(None), DEFAULT_TOKEN_LIFETIME_SECS);
        assert_eq!(parse_expires_in(Some("soon")), DEFAULT_TOKEN_LIFETIME_SECS);
    }
}
