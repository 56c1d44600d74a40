//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LingoSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `LINGO_*` environment variable overrides
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::LingoSettings;
use crate::context::OperationMode;
use crate::errors::SettingsError;

/// Resolve the settings file path.
///
/// `LINGO_SETTINGS` wins; otherwise `~/.lingo/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = read_env_string("LINGO_SETTINGS") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".lingo").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LingoSettings, SettingsError> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or invalid values are errors.
pub fn load_settings_from_path(path: &Path) -> Result<LingoSettings, SettingsError> {
    let defaults = serde_json::to_value(LingoSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LingoSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
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
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut LingoSettings) {
    if let Some(v) = read_env_string("LINGO_GLOBAL_LOCALE") {
        settings.global_locale = v;
    }
    if let Some(v) = read_env_string("LINGO_DEFAULT_MODE") {
        match v.parse::<OperationMode>() {
            Ok(mode) => settings.default_mode = mode,
            Err(_) => warn!(key = "LINGO_DEFAULT_MODE", value = %v, "invalid mode env var, ignoring"),
        }
    }
    if let Some(v) = read_env_u32("LINGO_POOL_SIZE", 2, 256) {
        settings.database.pool_size = v;
    }
    if let Some(v) = read_env_u32("LINGO_BUSY_TIMEOUT_MS", 0, 600_000) {
        settings.database.busy_timeout_ms = v;
    }
    if let Some(v) = read_env_string("LINGO_LOG_LEVEL") {
        settings.log_level = v;
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
