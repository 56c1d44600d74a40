//! Client and session.
//!
//! A [`Client`] owns the pool and the callback chains. A [`Session`] holds
//! one pooled connection and runs hooked operations on it; callbacks that
//! issue nested operations receive the same session and therefore the same
//! connection.

use lingo_core::OperationContext;
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::callbacks::Callbacks;
use crate::connection::{ConnectionPool, PooledConnection};
use crate::errors::Result;
use crate::raw::RawSession;
use crate::record::Record;
use crate::schema::EntitySchema;
use crate::statement::{Filter, Operation, Projection, Query, Statement};

/// Connection pool plus callback chains.
#[derive(Debug)]
pub struct Client {
    pool: ConnectionPool,
    callbacks: Callbacks,
}

impl Client {
    /// A client with the default `store:*` chains.
    pub fn new(pool: ConnectionPool) -> Result<Self> {
        Ok(Self {
            pool,
            callbacks: Callbacks::with_defaults()?,
        })
    }

    /// The callback chains.
    #[must_use]
    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Mutable callback chains, for registering extensions.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    /// The connection pool.
    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Open a hooked session on a pooled connection.
    pub fn session(&self) -> Result<Session<'_>> {
        Ok(Session {
            client: self,
            conn: self.pool.get()?,
        })
    }

    /// Open a hook-free session on a pooled connection.
    pub fn raw(&self) -> Result<RawSession> {
        Ok(RawSession::new(self.pool.get()?))
    }

    /// Create the table of `schema` if it does not exist.
    pub fn migrate(&self, schema: &EntitySchema) -> Result<()> {
        let conn = self.pool.get()?;
        let _ = conn.execute(&schema.create_table_sql(), [])?;
        debug!(entity = %schema.name, table = %schema.table, "table ready");
        Ok(())
    }
}

/// One connection running hooked operations.
pub struct Session<'c> {
    client: &'c Client,
    conn: PooledConnection,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl<'c> Session<'c> {
    /// The client this session belongs to.
    #[must_use]
    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// A hook-free session on a different pooled connection.
    pub fn raw(&self) -> Result<RawSession> {
        self.client.raw()
    }

    /// Run `stmt` through the chain of its operation.
    pub fn execute(&self, stmt: &mut Statement<'_>) -> Result<()> {
        self.client.callbacks.get(stmt.operation).execute(self, stmt)
    }

    /// Insert `record`. Callbacks may stamp columns onto it.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn create(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        record: &mut Record,
    ) -> Result<usize> {
        let mut stmt = Statement::new(schema, Operation::Create, ctx.clone());
        self.run_with_record(&mut stmt, record)
    }

    /// Update the row(s) identified by the primary columns of `record`,
    /// setting its non-primary columns.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn update(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        record: &mut Record,
    ) -> Result<usize> {
        let mut stmt = Statement::new(schema, Operation::Update, ctx.clone());
        self.run_with_record(&mut stmt, record)
    }

    /// Update the row(s) identified by the primary columns of `record`,
    /// setting only `attrs`.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn update_attrs(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        record: &mut Record,
        attrs: Record,
    ) -> Result<usize> {
        let mut stmt = Statement::new(schema, Operation::Update, ctx.clone());
        stmt.update_attrs = Some(attrs);
        self.run_with_record(&mut stmt, record)
    }

    /// Delete rows matching `filter`.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn delete(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        filter: Filter,
    ) -> Result<usize> {
        let mut stmt = Statement::new(schema, Operation::Delete, ctx.clone());
        stmt.filter = filter;
        self.execute(&mut stmt)?;
        Ok(stmt.rows_affected)
    }

    /// Read records.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn find(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        query: &Query,
    ) -> Result<Vec<Record>> {
        let mut stmt = Statement::new(schema, Operation::Query, ctx.clone());
        stmt.filter = query.filter.clone();
        stmt.order = query.order.clone();
        stmt.limit = query.limit;
        stmt.offset = query.offset;
        self.execute(&mut stmt)?;
        Ok(stmt.rows)
    }

    /// Read the first record of `query`.
    pub fn first(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        query: &Query,
    ) -> Result<Option<Record>> {
        let query = Query {
            limit: Some(1),
            ..query.clone()
        };
        Ok(self.find(schema, ctx, &query)?.into_iter().next())
    }

    /// Count rows matching `filter`.
    #[instrument(skip_all, fields(entity = %schema.name))]
    pub fn count(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        filter: Filter,
    ) -> Result<i64> {
        let mut stmt = Statement::new(schema, Operation::Row, ctx.clone());
        stmt.filter = filter;
        stmt.projection = Projection::Count;
        self.execute(&mut stmt)?;
        Ok(stmt.values.first().and_then(Value::as_i64).unwrap_or(0))
    }

    /// Read one column of every row matching `filter`, in store order.
    #[instrument(skip_all, fields(entity = %schema.name, column = %column))]
    pub fn pluck(
        &self,
        schema: &EntitySchema,
        ctx: &OperationContext,
        column: &str,
        filter: Filter,
    ) -> Result<Vec<Value>> {
        let mut stmt = Statement::new(schema, Operation::Row, ctx.clone());
        stmt.filter = filter;
        stmt.projection = Projection::Column(column.to_string());
        self.execute(&mut stmt)?;
        Ok(stmt.values)
    }

    fn run_with_record(&self, stmt: &mut Statement<'_>, record: &mut Record) -> Result<usize> {
        stmt.record = std::mem::take(record);
        let result = self.execute(stmt);
        *record = std::mem::take(&mut stmt.record);
        result.map(|()| stmt.rows_affected)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Position;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::errors::StoreError;
    use crate::schema::FieldDef;
    use crate::statement::Clause;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn notes() -> EntitySchema {
        EntitySchema::new("Note", "notes")
            .field(FieldDef::integer("id").primary())
            .field(FieldDef::text("body"))
            .field(FieldDef::bool("pinned"))
            .field(FieldDef::string_array("tags"))
            .soft_delete()
    }

    fn client() -> Client {
        let client = Client::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap();
        client.migrate(&notes()).unwrap();
        client
    }

    fn ctx() -> OperationContext {
        OperationContext::new()
    }

    #[test]
    fn create_backfills_rowid() {
        let client = client();
        let session = client.session().unwrap();
        let mut record = Record::new().with("body", "first");
        assert_eq!(session.create(&notes(), &ctx(), &mut record).unwrap(), 1);
        assert_eq!(record.get_i64("id"), Some(1));
    }

    #[test]
    fn create_sequences_id_in_composite_key() {
        let client = client();
        let schema = EntitySchema::new("Label", "labels")
            .field(FieldDef::integer("id").primary())
            .field(FieldDef::text("lang").primary())
            .field(FieldDef::text("text"));
        client.migrate(&schema).unwrap();
        let session = client.session().unwrap();

        let mut first = Record::new().with("lang", "en").with("text", "a");
        let mut second = Record::new().with("lang", "en").with("text", "b");
        let _ = session.create(&schema, &ctx(), &mut first).unwrap();
        let _ = session.create(&schema, &ctx(), &mut second).unwrap();
        assert_eq!(first.get_i64("id"), Some(1));
        assert_eq!(second.get_i64("id"), Some(2));

        let mut explicit = Record::new().with("id", 1).with("lang", "fr").with("text", "c");
        let _ = session.create(&schema, &ctx(), &mut explicit).unwrap();
        assert_eq!(explicit.get_i64("id"), Some(1));
        let ids = session.pluck(&schema, &ctx(), "id", Filter::new()).unwrap();
        assert_eq!(ids, vec![json!(1), json!(2), json!(1)]);
    }

    #[test]
    fn find_converts_column_types() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        let mut record = Record::new()
            .with("body", "x")
            .with("pinned", true)
            .with("tags", json!(["a", "b"]));
        let _ = session.create(&schema, &ctx(), &mut record).unwrap();

        let found = session
            .first(&schema, &ctx(), &Query::new(Filter::new().eq("id", 1)))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("pinned"), Some(&json!(true)));
        assert_eq!(found.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(found.get("deleted_at"), Some(&Value::Null));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let client = client();
        let session = client.session().unwrap();
        let mut record = Record::new().with("subtitle", "x");
        assert_matches!(
            session.create(&notes(), &ctx(), &mut record),
            Err(StoreError::UnknownField { .. })
        );
        assert_eq!(record.get_str("subtitle"), Some("x"));
    }

    #[test]
    fn update_by_primary_key() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        for body in ["a", "b"] {
            let _ = session
                .create(&schema, &ctx(), &mut Record::new().with("body", body))
                .unwrap();
        }
        let mut record = Record::new().with("id", 2).with("body", "B");
        assert_eq!(session.update(&schema, &ctx(), &mut record).unwrap(), 1);

        let bodies = session
            .pluck(&schema, &ctx(), "body", Filter::new())
            .unwrap();
        assert_eq!(bodies, vec![json!("a"), json!("B")]);
    }

    #[test]
    fn update_attrs_sets_only_attrs() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        let _ = session
            .create(&schema, &ctx(), &mut Record::new().with("body", "a").with("pinned", true))
            .unwrap();
        let mut record = Record::new().with("id", 1).with("body", "ignored");
        let n = session
            .update_attrs(&schema, &ctx(), &mut record, Record::new().with("pinned", false))
            .unwrap();
        assert_eq!(n, 1);
        let row = session
            .first(&schema, &ctx(), &Query::default())
            .unwrap()
            .unwrap();
        assert_eq!(row.get_str("body"), Some("a"));
        assert_eq!(row.get("pinned"), Some(&json!(false)));
    }

    #[test]
    fn update_without_where_is_refused() {
        let client = client();
        let session = client.session().unwrap();
        let mut record = Record::new().with("body", "x");
        assert_matches!(
            session.update(&notes(), &ctx(), &mut record),
            Err(StoreError::MissingWhere { operation: "update", .. })
        );
    }

    #[test]
    fn soft_delete_hides_rows() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        let _ = session
            .create(&schema, &ctx(), &mut Record::new().with("body", "a"))
            .unwrap();
        assert_eq!(
            session.delete(&schema, &ctx(), Filter::new().eq("id", 1)).unwrap(),
            1
        );
        assert_eq!(session.count(&schema, &ctx(), Filter::new()).unwrap(), 0);
        assert_eq!(
            session
                .count(&schema, &ctx().including_deleted(), Filter::new())
                .unwrap(),
            1
        );
        // already deleted
        assert_eq!(
            session.delete(&schema, &ctx(), Filter::new().eq("id", 1)).unwrap(),
            0
        );
    }

    #[test]
    fn delete_including_deleted_is_permanent() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        let _ = session
            .create(&schema, &ctx(), &mut Record::new().with("body", "a"))
            .unwrap();
        let _ = session.delete(&schema, &ctx(), Filter::new().eq("id", 1)).unwrap();
        let removed = session
            .delete(&schema, &ctx().including_deleted(), Filter::new().eq("id", 1))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            session
                .count(&schema, &ctx().including_deleted(), Filter::new())
                .unwrap(),
            0
        );
    }

    #[test]
    fn delete_without_where_is_refused() {
        let client = client();
        let session = client.session().unwrap();
        assert_matches!(
            session.delete(&notes(), &ctx(), Filter::new()),
            Err(StoreError::MissingWhere { operation: "delete", .. })
        );
    }

    #[test]
    fn find_orders_limits_and_offsets() {
        let client = client();
        let session = client.session().unwrap();
        let schema = notes();
        for body in ["c", "a", "b"] {
            let _ = session
                .create(&schema, &ctx(), &mut Record::new().with("body", body))
                .unwrap();
        }
        let rows = session
            .find(
                &schema,
                &ctx(),
                &Query::default().order_by("\"body\" ASC").offset(1),
            )
            .unwrap();
        let bodies: Vec<_> = rows.iter().filter_map(|r| r.get_str("body")).collect();
        assert_eq!(bodies, vec!["b", "c"]);
    }

    #[test]
    fn extension_callbacks_see_the_statement() {
        let mut client = client();
        client
            .callbacks_mut()
            .query
            .register_fn("test:only_pinned", Position::before("store:query"), |_, stmt| {
                stmt.add_condition(Clause::eq("pinned", true));
                Ok(())
            })
            .unwrap();
        let session = client.session().unwrap();
        let schema = notes();
        let _ = session
            .create(&schema, &ctx(), &mut Record::new().with("body", "a").with("pinned", true))
            .unwrap();
        let _ = session
            .create(&schema, &ctx(), &mut Record::new().with("body", "b"))
            .unwrap();
        let rows = session.find(&schema, &ctx(), &Query::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("body"), Some("a"));
    }

    #[test]
    fn callback_error_stops_the_chain() {
        let mut client = client();
        client
            .callbacks_mut()
            .create
            .register_fn("test:refuse", Position::First, |_, _| {
                Err(StoreError::callback("test:refuse", "no"))
            })
            .unwrap();
        let session = client.session().unwrap();
        let schema = notes();
        assert_matches!(
            session.create(&schema, &ctx(), &mut Record::new().with("body", "a")),
            Err(StoreError::Callback { .. })
        );
        assert_eq!(
            session
                .count(&schema, &ctx().including_deleted(), Filter::new())
                .unwrap(),
            0
        );
    }
}
