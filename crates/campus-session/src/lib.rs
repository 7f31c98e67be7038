//! Role-aware session lifecycle management.
//!
//! Owns the `Initializing → Authenticating → Authenticated /
//! Unauthenticated / Error` state machine, drives profile fetches against
//! the backend with bearer tokens minted by the identity provider, and
//! mirrors the active token into a cookie header for server-side readers.

#![deny(unsafe_code)]

pub mod errors;
pub mod manager;
pub mod mirror;
pub mod profile_client;
pub mod state;

pub use errors::SessionError;
pub use manager::SessionManager;
pub use mirror::{CookieHeaderMirror, TokenMirror};
pub use profile_client::ProfileClient;
pub use state::{LifecycleState, SessionSnapshot};
