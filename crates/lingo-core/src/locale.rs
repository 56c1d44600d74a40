//! Locale codes and locale resolution results.

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

/// Locale of canonical rows unless settings say otherwise.
pub const DEFAULT_GLOBAL_LOCALE: &str = "en-US";

/// Column every localizable entity carries.
pub const LANGUAGE_CODE_COLUMN: &str = "language_code";

/// Longest accepted locale code, matching the `language_code` column width.
pub const MAX_LOCALE_LEN: usize = 20;

/// Check that a locale code fits the `language_code` column.
pub fn validate_locale_code(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(CoreError::InvalidLocale {
            code: code.to_string(),
            reason: "empty",
        });
    }
    if code.len() > MAX_LOCALE_LEN {
        return Err(CoreError::InvalidLocale {
            code: code.to_string(),
            reason: "longer than 20 bytes",
        });
    }
    Ok(())
}

/// A locale chosen for one operation.
///
/// `is_specific` is `false` when the operation falls back to (or explicitly
/// names) the global locale, i.e. it targets canonical rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocale {
    /// The locale code.
    pub code: String,
    /// Whether the code names a non-global locale.
    pub is_specific: bool,
}

impl ResolvedLocale {
    /// The canonical locale.
    #[must_use]
    pub fn global(global: &str) -> Self {
        Self {
            code: global.to_string(),
            is_specific: false,
        }
    }

    /// Resolve `code` against the global locale.
    #[must_use]
    pub fn new(code: &str, global: &str) -> Self {
        Self {
            code: code.to_string(),
            is_specific: code != global,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_regular_codes() {
        assert!(validate_locale_code("en-US").is_ok());
        assert!(validate_locale_code("zh-Hant-TW").is_ok());
    }

    #[test]
    fn rejects_empty_code() {
        assert_matches!(
            validate_locale_code("  "),
            Err(CoreError::InvalidLocale { reason: "empty", .. })
        );
    }

    #[test]
    fn rejects_overlong_code() {
        let code = "x".repeat(MAX_LOCALE_LEN + 1);
        assert_matches!(validate_locale_code(&code), Err(CoreError::InvalidLocale { .. }));
    }

    #[test]
    fn resolved_global_is_not_specific() {
        let resolved = ResolvedLocale::new("en-US", "en-US");
        assert!(!resolved.is_specific);
        assert_eq!(resolved, ResolvedLocale::global("en-US"));
    }

    #[test]
    fn resolved_variant_is_specific() {
        let resolved = ResolvedLocale::new("fr-FR", "en-US");
        assert!(resolved.is_specific);
        assert_eq!(resolved.code, "fr-FR");
    }
}
