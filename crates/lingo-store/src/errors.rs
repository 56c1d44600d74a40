//! Error types for the persistence client.
//!
//! [`StoreError`] is returned by every client, session and callback
//! operation. Extensions report their own failures through
//! [`StoreError::Callback`], keeping the typed error as the source.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A record or attribute set named a column the schema does not declare.
    #[error("unknown field '{field}' on {entity}")]
    UnknownField {
        /// Entity name.
        entity: String,
        /// Offending column.
        field: String,
    },

    /// An update or delete would have touched every row.
    #[error("{operation} on {entity} requires a WHERE condition")]
    MissingWhere {
        /// Entity name.
        entity: String,
        /// Operation that was refused.
        operation: &'static str,
    },

    /// A record could not be built or read.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Callback registration error (e.g., duplicate name).
    #[error("registration error: {0}")]
    Registration(String),

    /// A registered callback failed.
    #[error("callback '{name}' failed: {source}")]
    Callback {
        /// Callback name.
        name: String,
        /// The callback's own error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap an extension error raised inside the callback `name`.
    pub fn callback(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Callback {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_matches!(err, StoreError::Sqlite(_));
    }

    #[test]
    fn unknown_field_display() {
        let err = StoreError::UnknownField {
            entity: "Article".into(),
            field: "subtitle".into(),
        };
        assert_eq!(err.to_string(), "unknown field 'subtitle' on Article");
    }

    #[test]
    fn missing_where_display() {
        let err = StoreError::MissingWhere {
            entity: "Article".into(),
            operation: "delete",
        };
        assert_eq!(err.to_string(), "delete on Article requires a WHERE condition");
    }

    #[test]
    fn callback_keeps_source() {
        let err = StoreError::callback("l10n:before_create", "nope");
        assert_eq!(err.to_string(), "callback 'l10n:before_create' failed: nope");
        assert!(std::error::Error::source(&err).is_some());
    }
}
