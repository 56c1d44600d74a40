//! Error types for core vocabulary and settings.

use thiserror::Error;

/// Errors raised while parsing core vocabulary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation mode string did not name a known mode.
    #[error("unknown operation mode: {0}")]
    InvalidMode(String),

    /// A locale code was empty or too long.
    #[error("invalid locale code '{code}': {reason}")]
    InvalidLocale {
        /// The rejected code.
        code: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
