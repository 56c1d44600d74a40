//! Per-operation localization context.
//!
//! Every store statement carries an [`OperationContext`]. It replaces an
//! untyped settings bag: the mode and both locales are explicit fields, and
//! nothing here outlives the operation chain it was handed to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// How localizable rows are scoped for one operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// No locale predicate at all.
    Unscoped,
    /// Only canonical rows.
    Global,
    /// Only rows of the requested locale.
    Locale,
    /// Canonical rows that have no variant in the requested locale.
    Reverse,
    /// Requested-locale rows, plus canonical rows where no variant exists.
    #[default]
    Fallback,
}

impl OperationMode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unscoped => "unscoped",
            Self::Global => "global",
            Self::Locale => "locale",
            Self::Reverse => "reverse",
            Self::Fallback => "fallback",
        }
    }

    /// Returns all mode variants.
    #[must_use]
    pub fn all() -> &'static [OperationMode] {
        &[
            Self::Unscoped,
            Self::Global,
            Self::Locale,
            Self::Reverse,
            Self::Fallback,
        ]
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unscoped" => Ok(Self::Unscoped),
            "global" => Ok(Self::Global),
            "locale" => Ok(Self::Locale),
            "reverse" => Ok(Self::Reverse),
            "fallback" => Ok(Self::Fallback),
            _ => Err(CoreError::InvalidMode(s.to_string())),
        }
    }
}

/// Typed flags for one operation chain.
///
/// Empty locale strings are treated the same as unset ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    /// Scoping mode; `None` means the engine's default (fallback).
    pub mode: Option<OperationMode>,
    /// Locale rows are read in.
    pub query_locale: Option<String>,
    /// Locale writes target ("localize to"). Falls back to `query_locale`.
    pub write_locale: Option<String>,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
}

impl OperationContext {
    /// An empty context: default mode, global locale, soft-delete scoping on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scoping mode.
    #[must_use]
    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the locale rows are read in.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.query_locale = Some(locale.into());
        self
    }

    /// Set the locale writes target.
    #[must_use]
    pub fn localize_to(mut self, locale: impl Into<String>) -> Self {
        self.write_locale = Some(locale.into());
        self
    }

    /// Include soft-deleted rows.
    #[must_use]
    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Whether the mode was explicitly set to [`OperationMode::Unscoped`].
    #[must_use]
    pub fn is_unscoped_mode(&self) -> bool {
        self.mode == Some(OperationMode::Unscoped)
    }

    /// The mode, or `default` when unset.
    #[must_use]
    pub fn mode_or(&self, default: OperationMode) -> OperationMode {
        self.mode.unwrap_or(default)
    }

    /// The query locale if set and non-empty.
    #[must_use]
    pub fn query_locale(&self) -> Option<&str> {
        self.query_locale.as_deref().filter(|l| !l.is_empty())
    }

    /// The write locale if set and non-empty.
    #[must_use]
    pub fn write_locale(&self) -> Option<&str> {
        self.write_locale.as_deref().filter(|l| !l.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
