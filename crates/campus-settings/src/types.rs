//! Settings type definitions with compiled defaults.
//!
//! All wire names are camelCase to match the dashboard's settings file.

use serde::{Deserialize, Serialize};

/// Top-level settings for the Campus session manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampusSettings {
    /// Settings schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Identity-provider endpoints and credentials.
    #[serde(default)]
    pub identity: IdentitySettings,
    /// Backend REST API settings.
    #[serde(default)]
    pub backend: BackendSettings,
    /// Session lifecycle knobs.
    #[serde(default)]
    pub session: SessionSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for CampusSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            identity: IdentitySettings::default(),
            backend: BackendSettings::default(),
            session: SessionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Identity-provider (token issuer) settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySettings {
    /// Public API key sent as a query parameter to the identity toolkit.
    #[serde(default)]
    pub api_key: String,
    /// Account-operations base URL (sign-in, sign-up).
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// Token-mint base URL (refresh-token exchange).
    #[serde(default = "default_identity_token_url")]
    pub token_url: String,
    /// Seconds before expiry at which a cached token counts as stale.
    #[serde(default = "default_token_expiry_buffer")]
    pub token_expiry_buffer_seconds: i64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_identity_base_url(),
            token_url: default_identity_token_url(),
            token_expiry_buffer_seconds: default_token_expiry_buffer(),
        }
    }
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}
fn default_identity_token_url() -> String {
    "https://securetoken.googleapis.com".to_string()
}
fn default_token_expiry_buffer() -> i64 {
    300
}

/// Backend REST API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSettings {
    /// Base URL of the dashboard backend.
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,
    /// Path of the profile endpoint, relative to the base URL.
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
    /// Per-request timeout for profile fetches, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_base_url(),
            profile_path: default_profile_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_backend_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_profile_path() -> String {
    "/api/auth/me".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}

/// Session lifecycle knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    /// Name of the token-mirror cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Max-Age of the token-mirror cookie, in seconds.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: u64,
    /// Maximum profile-fetch attempts per `refresh()` call.
    #[serde(default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,
    /// Delay between fetch attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age(),
            max_fetch_attempts: default_max_fetch_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_cookie_name() -> String {
    "auth-token".to_string()
}
fn default_cookie_max_age() -> u64 {
    86_400
}
fn default_max_fetch_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = CampusSettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.session.cookie_name, "auth-token");
        assert_eq!(settings.session.cookie_max_age_secs, 86_400);
        assert_eq!(settings.session.max_fetch_attempts, 3);
        assert_eq!(settings.session.retry_delay_ms, 1_000);
        assert_eq!(settings.backend.profile_path, "/api/auth/me");
        assert_eq!(settings.backend.timeout_ms, 10_000);
        assert_eq!(settings.identity.token_expiry_buffer_seconds, 300);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn empty_json_fills_defaults() {
        let settings: CampusSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.session.max_fetch_attempts, 3);
        assert_eq!(settings.backend.base_url, "http://localhost:8080");
    }

    #[test]
    fn partial_section_fills_defaults() {
        let settings: CampusSettings =
            serde_json::from_str(r#"{"session":{"cookieName":"sid"}}"#).unwrap();
        assert_eq!(settings.session.cookie_name, "sid");
        assert_eq!(settings.session.cookie_max_age_secs, 86_400);
    }

    #[test]
    fn serde_roundtrip_camel_case() {
        let settings = CampusSettings::default();
        let json = serde_json::to_value(&settings).unwrap();
        assert!(json["session"]["cookieMaxAgeSecs"].is_number());
        assert!(json["backend"]["profilePath"].is_string());
        assert!(json["identity"]["tokenExpiryBufferSeconds"].is_number());
    }
}
