//! The session manager.
//!
//! Bridges the identity provider's session to the application profile
//! fetched from the backend, keeps a bearer token available (in memory and
//! mirrored into the cookie), and exposes the imperative sign-in /
//! sign-out / refresh operations.
//!
//! # State machine
//!
//! ```text
//! Initializing ─┬─> Authenticating ─┬─> Authenticated ──refresh()──┐
//!               │                   └─> Error                      │
//!               └─> Unauthenticated <── logout() / session end <───┘
//! ```
//!
//! The manager is the single writer of the session snapshot; views read it
//! through a `watch` channel. Profile-fetch attempts are serialized by an
//! internal gate so a session-change notification racing an in-flight
//! `refresh()` cannot interleave commits. A fetch superseded by a logout is
//! discarded at the commit point rather than applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use campus_core::{UserProfile, validate_profile};
use campus_identity::{IdentityEvent, IdentityProvider};
use campus_settings::SessionSettings;

use crate::errors::SessionError;
use crate::mirror::TokenMirror;
use crate::profile_client::ProfileClient;
use crate::state::{LifecycleState, SessionSnapshot};

/// Role-aware session lifecycle manager.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    profiles: ProfileClient,
    mirror: Arc<dyn TokenMirror>,
    snapshot: watch::Sender<SessionSnapshot>,
    /// Serializes profile-fetch attempts (session-change vs. `refresh()`).
    fetch_gate: tokio::sync::Mutex<()>,
    max_fetch_attempts: u32,
    retry_delay: Duration,
}

impl SessionManager {
    /// Create a manager in the `Initializing` state.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: ProfileClient,
        mirror: Arc<dyn TokenMirror>,
        settings: &SessionSettings,
    ) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::initializing());
        Self {
            provider,
            profiles,
            mirror,
            snapshot,
            fetch_gate: tokio::sync::Mutex::new(()),
            max_fetch_attempts: settings.max_fetch_attempts.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }

    /// Subscribe to session snapshots (many readers, one writer).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    fn set_state(&self, snap: SessionSnapshot) {
        debug!(state = %snap.state, "session state change");
        let _ = self.snapshot.send_replace(snap);
    }

    /// Resolve the initial lifecycle state at startup.
    ///
    /// With an active identity session this drives `Initializing →
    /// Authenticating` and loads the profile; otherwise the machine settles
    /// in `Unauthenticated`.
    #[tracing::instrument(skip_all)]
    pub async fn bootstrap(&self) -> Result<(), SessionError> {
        if self.provider.has_session() {
            let _ = self.load_session().await?;
        } else {
            self.set_state(SessionSnapshot::unauthenticated());
        }
        Ok(())
    }

    /// Delegate credential verification to the identity provider.
    ///
    /// Does not touch the lifecycle state: the provider's session-change
    /// notification drives the profile load, which avoids a race between
    /// this call returning and the profile being fetched. Bad credentials
    /// propagate immediately and are never retried.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), SessionError> {
        self.provider
            .sign_in_with_password(email, password)
            .await
            .map_err(SessionError::from)
    }

    /// Create a new identity-provider account.
    ///
    /// The application profile document is created by the backend; the
    /// display name is the only seed forwarded to the provider.
    #[tracing::instrument(skip_all)]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(), SessionError> {
        self.provider
            .sign_up(email, password, display_name)
            .await
            .map_err(SessionError::from)
    }

    /// End the session, fail-safe to logged-out.
    ///
    /// Clears in a fixed order: local state first, then the token mirror,
    /// then the identity provider. A provider sign-out failure is logged
    /// and swallowed so local state can never remain authenticated.
    /// Idempotent.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self) {
        self.set_state(SessionSnapshot::unauthenticated());
        self.mirror.clear();
        if let Err(e) = self.provider.sign_out().await {
            warn!("identity provider sign-out failed, local session cleared anyway: {e}");
        }
    }

    /// Force a token re-mint and re-fetch the profile.
    ///
    /// Makes up to `max_fetch_attempts` attempts (sleeping between them)
    /// for mint/fetch errors; invariant errors abort immediately. Leaves
    /// the machine in `Error` and returns the most specific error when all
    /// attempts are exhausted.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self) -> Result<UserProfile, SessionError> {
        if !self.provider.has_session() {
            return Err(SessionError::NoSession);
        }
        self.set_state(SessionSnapshot::authenticating());

        let mut attempt = 0u32;
        let err = loop {
            attempt += 1;
            match self.fetch_and_commit(true).await {
                Ok(profile) => return Ok(profile),
                Err(e) if e.is_retryable() && attempt < self.max_fetch_attempts => {
                    warn!(attempt, "profile fetch failed, retrying: {e}");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => break e,
            }
        };

        // NoSession here means a logout superseded the fetch; the machine
        // is already Unauthenticated and must stay there.
        if !matches!(err, SessionError::NoSession) {
            self.set_state(SessionSnapshot::error());
        }
        Err(err)
    }

    /// Spawn the session-change watcher task.
    ///
    /// Consumes provider notifications for the lifetime of the page:
    /// a session establishment triggers a profile load, a session end
    /// clears local state and the token mirror.
    pub fn spawn_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut events = manager.provider.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(IdentityEvent::SessionEstablished { uid }) => {
                        debug!(%uid, "identity session established");
                        if let Err(e) = manager.load_session().await {
                            warn!("profile load after session establishment failed: {e}");
                        }
                    }
                    Ok(IdentityEvent::SessionEnded) => {
                        debug!("identity session ended");
                        manager.set_state(SessionSnapshot::unauthenticated());
                        manager.mirror.clear();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Load the profile for a just-established (or startup) session.
    ///
    /// One fetch step, no outer retry loop: only the missing-district
    /// recovery inside the step re-attempts.
    async fn load_session(&self) -> Result<UserProfile, SessionError> {
        self.set_state(SessionSnapshot::authenticating());
        match self.fetch_and_commit(false).await {
            Ok(profile) => {
                info!(role = %profile.role, "session authenticated");
                Ok(profile)
            }
            Err(e) => {
                if !matches!(e, SessionError::NoSession) {
                    self.set_state(SessionSnapshot::error());
                }
                Err(e)
            }
        }
    }

    /// One profile-fetch step: mint → mirror → fetch → validate → commit.
    ///
    /// A `MissingDistrict` violation is recovered exactly once with a
    /// forced re-mint and refetch. The commit is guarded by the lifecycle
    /// state so a result that arrives after a logout is discarded.
    async fn fetch_and_commit(&self, force_mint: bool) -> Result<UserProfile, SessionError> {
        let _gate = self.fetch_gate.lock().await;

        let result = match self.mint_and_fetch(force_mint).await {
            Err(SessionError::Invariant(violation)) if violation.is_recoverable() => {
                info!("profile missing districtId, re-minting token and refetching");
                self.mint_and_fetch(true).await
            }
            other => other,
        };

        match result {
            Ok((token, profile)) => {
                let state = self.snapshot.borrow().state;
                if !matches!(
                    state,
                    LifecycleState::Authenticating | LifecycleState::Authenticated
                ) {
                    // Superseded by a logout mid-flight: discard, and undo
                    // the mirror write from the mint.
                    self.mirror.clear();
                    return Err(SessionError::NoSession);
                }
                self.set_state(SessionSnapshot::authenticated(token, profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                self.mirror.clear();
                Err(e)
            }
        }
    }

    /// Mint a token (mirroring it) and fetch + validate the profile.
    async fn mint_and_fetch(
        &self,
        force_mint: bool,
    ) -> Result<(String, UserProfile), SessionError> {
        let token = self.provider.mint_token(force_mint).await?;
        self.mirror.store(&token);
        let payload = self.profiles.fetch(&token).await?;
        let profile = validate_profile(payload)?;
        Ok((token, profile))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
