//! Identity-provider capability trait.
//!
//! The session manager is written against this seam rather than a concrete
//! vendor SDK. The capability set mirrors what the dashboard consumes:
//! password sign-in/sign-up, sign-out, forced token mint, and session-change
//! notifications.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::IdentityError;

/// A session-change notification from the identity provider.
///
/// The Rust rendition of an `onSessionChange(callback)` subscription:
/// consumers receive these over a broadcast channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityEvent {
    /// The provider established a session for the given provider user ID.
    SessionEstablished {
        /// Provider-side user ID.
        uid: String,
    },
    /// The provider session ended (sign-out or revocation).
    SessionEnded,
}

/// Capability set consumed from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and establish a session.
    ///
    /// Emits [`IdentityEvent::SessionEstablished`] on success; the caller
    /// must not assume a profile exists yet.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), IdentityError>;

    /// Create a new provider account and establish a session for it.
    ///
    /// `display_name` is the profile seed forwarded to the provider; the
    /// application profile document itself is created by the backend.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(), IdentityError>;

    /// End the provider session.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Return a bearer token for the current session.
    ///
    /// With `force_refresh` the provider must mint a fresh token, bypassing
    /// any cache. Fails with [`IdentityError::NoSession`] when no session
    /// is active.
    async fn mint_token(&self, force_refresh: bool) -> Result<String, IdentityError>;

    /// Whether an identity session is currently active.
    fn has_session(&self) -> bool;

    /// Subscribe to session-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}
