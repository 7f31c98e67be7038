//! # campus-settings
//!
//! Configuration management with layered sources for the Campus session
//! manager.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`CampusSettings::default()`]
//! 2. **User file** — `~/.campus/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `CAMPUS_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use campus_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("profile endpoint: {}{}", settings.backend.base_url, settings.backend.profile_path);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. Falls back to compiled
/// defaults if loading fails.
static SETTINGS: OnceLock<CampusSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.campus/settings.json` with env
/// var overrides. On subsequent calls, returns the cached value.
pub fn get_settings() -> &'static CampusSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: CampusSettings) -> std::result::Result<(), CampusSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
