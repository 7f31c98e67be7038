//! # campus-identity
//!
//! Identity-provider integration for the Campus dashboard.
//!
//! - [`IdentityProvider`]: the capability seam the session manager consumes
//!   (password sign-in/sign-up, sign-out, forced token mint, session-change
//!   notifications)
//! - [`RestIdentityProvider`]: a REST identity-toolkit implementation with
//!   a cached ID token and refresh-token based re-mint

#![deny(unsafe_code)]

pub mod errors;
pub mod provider;
pub mod rest;

pub use errors::IdentityError;
pub use provider::{IdentityEvent, IdentityProvider};
pub use rest::RestIdentityProvider;
