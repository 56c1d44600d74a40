//! Hook-free access.
//!
//! A [`RawSession`] owns its own pooled connection and has no callback
//! chain, so writes issued from inside a callback cannot re-enter it.

use rusqlite::{Connection, params_from_iter};
use serde_json::Value;
use tracing::debug;

use crate::connection::PooledConnection;
use crate::errors::{Result, StoreError};
use crate::record::{Record, to_sql_value};
use crate::schema::quote_ident;
use crate::statement::Filter;

/// A pooled connection without hooks.
pub struct RawSession {
    conn: PooledConnection,
}

impl std::fmt::Debug for RawSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSession").finish_non_exhaustive()
    }
}

impl RawSession {
    pub(crate) fn new(conn: PooledConnection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run one SQL statement with positional parameters.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let bound: Vec<_> = params.iter().map(to_sql_value).collect();
        Ok(self.conn.execute(sql, params_from_iter(bound))?)
    }

    /// `UPDATE table SET <values> WHERE <filter>`.
    ///
    /// An empty filter is refused; an empty value set updates nothing.
    pub fn update_columns(&self, table: &str, filter: &Filter, values: &Record) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }
        let (where_sql, where_params) = filter.to_sql().ok_or_else(|| StoreError::MissingWhere {
            entity: table.to_string(),
            operation: "raw update",
        })?;

        let assignments: Vec<String> = values
            .iter()
            .map(|(col, _)| format!("{} = ?", quote_ident(col)))
            .collect();
        let mut params: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        params.extend(where_params);

        let sql = format!(
            "UPDATE {} SET {} WHERE {where_sql}",
            quote_ident(table),
            assignments.join(", ")
        );
        let rows = self.execute(&sql, &params)?;
        debug!(table, rows, "raw update");
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::session::Client;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn client() -> Client {
        let client = Client::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap();
        client
            .raw()
            .unwrap()
            .execute(
                "CREATE TABLE items (id INTEGER, lang TEXT, title TEXT, PRIMARY KEY (id, lang))",
                &[],
            )
            .unwrap();
        client
    }

    #[test]
    fn update_columns_touches_matching_rows() {
        let client = client();
        let raw = client.raw().unwrap();
        for lang in ["en", "fr", "de"] {
            let _ = raw
                .execute(
                    "INSERT INTO items VALUES (1, ?, 'old')",
                    &[json!(lang)],
                )
                .unwrap();
        }
        let filter = Filter::new()
            .eq("id", 1)
            .and(crate::statement::Clause::new("\"lang\" <> ?", vec![json!("en")]));
        let n = raw
            .update_columns("items", &filter, &Record::new().with("title", "new"))
            .unwrap();
        assert_eq!(n, 2);

        let en: String = raw
            .connection()
            .query_row("SELECT title FROM items WHERE lang = 'en'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(en, "old");
    }

    #[test]
    fn update_columns_refuses_empty_filter() {
        let client = client();
        let raw = client.raw().unwrap();
        assert_matches!(
            raw.update_columns("items", &Filter::new(), &Record::new().with("title", "x")),
            Err(StoreError::MissingWhere { .. })
        );
    }

    #[test]
    fn raw_and_hooked_sessions_share_the_database() {
        let client = client();
        let session = client.session().unwrap();
        let _ = session
            .raw()
            .unwrap()
            .execute("INSERT INTO items VALUES (2, 'en', 'x')", &[])
            .unwrap();
        let count: i64 = session
            .connection()
            .query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
