//! Engine settings with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LingoSettings::default()`]
//! 2. **Settings file**: `$LINGO_SETTINGS` or `~/.lingo/settings.json`
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `LINGO_*` overrides (highest priority)

pub mod loader;

pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};

use serde::{Deserialize, Serialize};

use crate::context::OperationMode;
use crate::errors::SettingsError;
use crate::locale::{DEFAULT_GLOBAL_LOCALE, validate_locale_code};

/// Top-level settings for the localization engine and its store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LingoSettings {
    /// Locale of canonical rows.
    pub global_locale: String,
    /// Mode used when an operation does not set one.
    pub default_mode: OperationMode,
    /// Connection pool settings.
    pub database: DatabaseSettings,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for LingoSettings {
    fn default() -> Self {
        Self {
            global_locale: DEFAULT_GLOBAL_LOCALE.to_string(),
            default_mode: OperationMode::Fallback,
            database: DatabaseSettings::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl LingoSettings {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_locale_code(&self.global_locale)
            .map_err(|e| SettingsError::InvalidValue(format!("globalLocale: {e}")))?;
        // Propagation writes borrow a second connection while the first is held.
        if self.database.pool_size < 2 {
            return Err(SettingsError::InvalidValue(format!(
                "database.poolSize must be at least 2, got {}",
                self.database.pool_size
            )));
        }
        Ok(())
    }
}

/// Connection pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Maximum pool size.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size in KiB.
    pub cache_size_kib: i64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
