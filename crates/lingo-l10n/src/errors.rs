//! Error types for the localization engine.
//!
//! Inside callback chains these errors travel as
//! [`StoreError::Callback`]; [`LocalizationError::from_store`] (and the
//! `From<StoreError>` impl) recovers the typed variant.

use lingo_core::CoreError;
use lingo_store::StoreError;
use thiserror::Error;

/// Errors raised by the localization engine.
#[derive(Debug, Error)]
pub enum LocalizationError {
    /// A non-global row of a non-locale-creatable entity was created.
    #[error("the resource {entity} cannot be created in {locale}")]
    CreationRejected {
        /// Entity name.
        entity: String,
        /// Requested locale.
        locale: String,
    },

    /// Canonical-field propagation failed after the primary write committed.
    #[error("propagating sync columns of {entity} failed: {source}")]
    PropagationFailed {
        /// Entity name.
        entity: String,
        /// The raw update's error.
        #[source]
        source: StoreError,
    },

    /// The entity does not participate in localization.
    #[error("{0} is not localizable")]
    NotLocalizable(String),

    /// A localize request did not carry every identity column.
    #[error("missing identity value '{column}' for {entity}")]
    MissingIdentity {
        /// Entity name.
        entity: String,
        /// Column without a value.
        column: String,
    },

    /// The row to localize from does not exist.
    #[error("no {entity} row in {locale} to localize from")]
    SourceNotFound {
        /// Entity name.
        entity: String,
        /// Source locale.
        locale: String,
    },

    /// Invalid locale code in configuration.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Any other store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl LocalizationError {
    /// Unwrap a localization error raised inside a callback; anything else
    /// becomes [`LocalizationError::Store`].
    #[must_use]
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Callback { name, source } => match source.downcast::<Self>() {
                Ok(inner) => *inner,
                Err(source) => Self::Store(StoreError::Callback { name, source }),
            },
            other => Self::Store(other),
        }
    }

    /// Wrap into a [`StoreError`] raised by the callback `name`.
    pub(crate) fn into_callback(self, name: &str) -> StoreError {
        StoreError::callback(name, self)
    }
}

impl From<StoreError> for LocalizationError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err)
    }
}

/// Result type for localization operations.
pub type Result<T> = std::result::Result<T, LocalizationError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn creation_rejected_display() {
        let err = LocalizationError::CreationRejected {
            entity: "Product".into(),
            locale: "fr-FR".into(),
        };
        assert_eq!(err.to_string(), "the resource Product cannot be created in fr-FR");
    }

    #[test]
    fn from_store_recovers_typed_error() {
        let store = LocalizationError::CreationRejected {
            entity: "Product".into(),
            locale: "fr-FR".into(),
        }
        .into_callback("l10n:before_create");
        assert_matches!(store, StoreError::Callback { ref name, .. } if name == "l10n:before_create");
        assert_matches!(
            LocalizationError::from_store(store),
            LocalizationError::CreationRejected { locale, .. } if locale == "fr-FR"
        );
    }

    #[test]
    fn foreign_callback_errors_stay_store_errors() {
        let store = StoreError::callback("other:hook", "boom");
        assert_matches!(
            LocalizationError::from(store),
            LocalizationError::Store(StoreError::Callback { name, .. }) if name == "other:hook"
        );
    }

    #[test]
    fn plain_store_errors_pass_through() {
        let err = LocalizationError::from(StoreError::Registration("dup".into()));
        assert_matches!(err, LocalizationError::Store(StoreError::Registration(_)));
    }

    #[test]
    fn propagation_failure_keeps_source() {
        let err = LocalizationError::PropagationFailed {
            entity: "Article".into(),
            source: StoreError::Registration("x".into()),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
