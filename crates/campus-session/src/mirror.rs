//! Token mirror: the cookie copy of the current bearer token.
//!
//! Non-JS request middleware cannot read the in-memory session store, so the
//! manager mirrors the current token into a short-lived, path-scoped cookie.
//! Mirror writes happen exactly once per successful mint and once per
//! logout/fetch failure; they are explicit transition hooks, not re-render
//! side effects.

use std::sync::Arc;

use campus_settings::SessionSettings;

/// Sink for the token mirror.
pub trait TokenMirror: Send + Sync {
    /// Mirror a freshly minted token.
    fn store(&self, token: &str);
    /// Expire the mirrored token.
    fn clear(&self);
}

/// Format a `Set-Cookie` header value mirroring `token`.
#[must_use]
pub fn format_set_cookie(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; Path=/; Max-Age={max_age_secs}; SameSite=Lax")
}

/// Format a `Set-Cookie` header value that expires the mirror cookie.
#[must_use]
pub fn format_clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Lax")
}

/// Token mirror that exposes the current `Set-Cookie` header through a
/// shared slot, for the host environment to attach to responses.
pub struct CookieHeaderMirror {
    name: String,
    max_age_secs: u64,
    header: Arc<parking_lot::Mutex<Option<String>>>,
}

impl CookieHeaderMirror {
    /// Create a mirror writing cookies under `name` with the given Max-Age.
    #[must_use]
    pub fn new(name: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
            header: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Create a mirror driven by the configured cookie name and Max-Age.
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(settings.cookie_name.clone(), settings.cookie_max_age_secs)
    }

    /// The pending `Set-Cookie` header, if any write has happened.
    #[must_use]
    pub fn header(&self) -> Option<String> {
        self.header.lock().clone()
    }

    /// The token currently mirrored, or `None` when cleared/expired.
    #[must_use]
    pub fn current_token(&self) -> Option<String> {
        let guard = self.header.lock();
        let header = guard.as_deref()?;
        let pair = header.split(';').next()?;
        let value = pair.split_once('=')?.1;
        (!value.is_empty()).then(|| value.to_string())
    }
}

impl TokenMirror for CookieHeaderMirror {
    fn store(&self, token: &str) {
        *self.header.lock() = Some(format_set_cookie(&self.name, token, self.max_age_secs));
    }

    fn clear(&self) {
        *self.header.lock() = Some(format_clear_cookie(&self.name));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_format() {
        assert_eq!(
            format_set_cookie("auth-token", "tok1", 86_400),
            "auth-token=tok1; Path=/; Max-Age=86400; SameSite=Lax"
        );
    }

    #[test]
    fn clear_cookie_uses_expired_date() {
        let header = format_clear_cookie("auth-token");
        assert!(header.starts_with("auth-token=;"));
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn mirror_starts_empty() {
        let mirror = CookieHeaderMirror::new("auth-token", 86_400);
        assert!(mirror.header().is_none());
        assert!(mirror.current_token().is_none());
    }

    #[test]
    fn store_then_read_token() {
        let mirror = CookieHeaderMirror::new("auth-token", 86_400);
        mirror.store("tok1");
        assert_eq!(mirror.current_token().as_deref(), Some("tok1"));
        assert!(mirror.header().unwrap().contains("Max-Age=86400"));
    }

    #[test]
    fn clear_expires_the_cookie() {
        let mirror = CookieHeaderMirror::new("auth-token", 86_400);
        mirror.store("tok1");
        mirror.clear();
        assert!(mirror.current_token().is_none());
        assert!(mirror.header().unwrap().contains("Expires="));
    }

    #[test]
    fn from_settings_drives_name_and_max_age() {
        let settings = SessionSettings {
            cookie_name: "sid".to_string(),
            cookie_max_age_secs: 3_600,
            ..SessionSettings::default()
        };
        let mirror = CookieHeaderMirror::from_settings(&settings);
        mirror.store("tok1");
        let header = mirror.header().unwrap();
        assert!(header.starts_with("sid=tok1;"));
        assert!(header.contains("Max-Age=3600"));

        mirror.clear();
        assert!(mirror.header().unwrap().starts_with("sid=;"));
    }

    #[test]
    fn store_overwrites_previous_token() {
        let mirror = CookieHeaderMirror::new("auth-token", 86_400);
        mirror.store("tok1");
        mirror.store("tok2");
        assert_eq!(mirror.current_token().as_deref(), Some("tok2"));
    }
}
