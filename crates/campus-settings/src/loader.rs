//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CampusSettings::default()`]
//! 2. If `~/.campus/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `CAMPUS_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::CampusSettings;

/// Resolve the path to the settings file (`~/.campus/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".campus").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CampusSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<CampusSettings> {
    let defaults = serde_json::to_value(CampusSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: CampusSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Numeric vars are range-checked; invalid values are ignored with a warn
/// (falling back to the file/default value).
pub fn apply_env_overrides(settings: &mut CampusSettings) {
    // ── Identity provider ───────────────────────────────────────────
    if let Some(v) = read_env_string("CAMPUS_IDENTITY_API_KEY") {
        settings.identity.api_key = v;
    }
    if let Some(v) = read_env_string("CAMPUS_IDENTITY_BASE_URL") {
        settings.identity.base_url = v;
    }
    if let Some(v) = read_env_string("CAMPUS_IDENTITY_TOKEN_URL") {
        settings.identity.token_url = v;
    }

    // ── Backend ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("CAMPUS_BACKEND_URL") {
        settings.backend.base_url = v;
    }
    if let Some(v) = read_env_string("CAMPUS_PROFILE_PATH") {
        settings.backend.profile_path = v;
    }
    if let Some(v) = read_env_u64("CAMPUS_TIMEOUT_MS", 1_000, 300_000) {
        settings.backend.timeout_ms = v;
    }

    // ── Session lifecycle ───────────────────────────────────────────
    if let Some(v) = read_env_string("CAMPUS_COOKIE_NAME") {
        settings.session.cookie_name = v;
    }
    if let Some(v) = read_env_u32("CAMPUS_MAX_FETCH_ATTEMPTS", 1, 10) {
        settings.session.max_fetch_attempts = v;
    }
    if let Some(v) = read_env_u64("CAMPUS_RETRY_DELAY_MS", 100, 60_000) {
        settings.session.retry_delay_ms = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("CAMPUS_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
