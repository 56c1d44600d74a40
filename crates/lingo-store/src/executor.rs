//! Default `store:*` callbacks.
//!
//! These do the actual SQL work. Statement handles are scoped to the
//! executor function so nothing stays prepared while later callbacks run
//! nested operations on the same connection.

use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::debug;

use crate::callbacks::{Callbacks, Position};
use crate::errors::{Result, StoreError};
use crate::record::{Record, from_sql_value, is_zero, to_sql_value};
use crate::schema::{
    CREATED_AT_COLUMN, DELETED_AT_COLUMN, EntitySchema, FieldDef, FieldType, UPDATED_AT_COLUMN,
    quote_ident,
};
use crate::session::Session;
use crate::statement::{Clause, Filter, Projection, Statement};

pub(crate) fn register_defaults(callbacks: &mut Callbacks) -> Result<()> {
    callbacks
        .create
        .register_fn("store:before_create", Position::Last, before_create)?;
    callbacks.create.register_fn("store:create", Position::Last, create)?;
    callbacks
        .create
        .register_fn("store:after_create", Position::Last, after_write)?;

    callbacks
        .update
        .register_fn("store:before_update", Position::Last, before_update)?;
    callbacks.update.register_fn("store:update", Position::Last, update)?;
    callbacks
        .update
        .register_fn("store:after_update", Position::Last, after_write)?;

    callbacks
        .delete
        .register_fn("store:before_delete", Position::Last, before_delete)?;
    callbacks.delete.register_fn("store:delete", Position::Last, delete)?;

    callbacks.query.register_fn("store:query", Position::Last, query)?;
    callbacks.row.register_fn("store:row_query", Position::Last, query)?;
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn check_fields(schema: &EntitySchema, record: &Record) -> Result<()> {
    match record.iter().find(|(col, _)| schema.lookup_field(col).is_none()) {
        Some((col, _)) => Err(StoreError::UnknownField {
            entity: schema.name.clone(),
            field: col.to_string(),
        }),
        None => Ok(()),
    }
}

fn stamp_if_declared(schema: &EntitySchema, record: &mut Record, column: &str, value: &str) {
    if schema.lookup_field(column).is_some() && record.get(column).is_none_or(is_zero) {
        record.set(column, value);
    }
}

fn bind(params: &[Value]) -> Vec<SqlValue> {
    params.iter().map(to_sql_value).collect()
}

/// Caller and callback conditions plus the soft-delete scope when it applies.
fn scoped_filter(stmt: &Statement<'_>) -> Filter {
    let mut filter = stmt.conditions();
    if stmt.schema.has_soft_delete() && !stmt.context.include_deleted {
        filter.push(Clause::is_null(DELETED_AT_COLUMN));
    }
    filter
}

/// Lone integer primary column, which `SQLite` assigns on insert.
fn rowid_alias(schema: &EntitySchema) -> Option<&FieldDef> {
    let mut primaries = schema.primary_fields();
    match (primaries.next(), primaries.next()) {
        (Some(pk), None) if pk.field_type == FieldType::Integer => Some(pk),
        _ => None,
    }
}

/// Integer prioritized key inside a composite primary key.
///
/// `SQLite` only assigns rowid aliases, so these are sequenced on insert
/// from the table maximum, soft-deleted rows included. The read and the
/// insert share one connection but are not atomic across connections.
fn sequenced_key(schema: &EntitySchema) -> Option<&FieldDef> {
    if rowid_alias(schema).is_some() {
        return None;
    }
    schema
        .prioritized_primary_key()
        .filter(|pk| pk.field_type == FieldType::Integer)
}

// ─────────────────────────────────────────────────────────────────────────────
// Create
// ─────────────────────────────────────────────────────────────────────────────

fn before_create(_: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    check_fields(stmt.schema, &stmt.record)?;
    let now = now();
    stamp_if_declared(stmt.schema, &mut stmt.record, CREATED_AT_COLUMN, &now);
    stamp_if_declared(stmt.schema, &mut stmt.record, UPDATED_AT_COLUMN, &now);
    Ok(())
}

fn create(session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    let schema = stmt.schema;
    let conn = session.connection();
    let rowid = rowid_alias(schema);

    if let Some(pk) = sequenced_key(schema) {
        if stmt.record.get(&pk.name).is_none_or(is_zero) {
            let next: i64 = conn.query_row(
                &format!(
                    "SELECT COALESCE(MAX({}), 0) + 1 FROM {}",
                    quote_ident(&pk.name),
                    quote_ident(&schema.table)
                ),
                [],
                |row| row.get(0),
            )?;
            debug!(entity = %schema.name, key = %pk.name, next, "assigned sequenced key");
            stmt.record.set(pk.name.clone(), next);
        }
    }

    let (columns, values): (Vec<String>, Vec<SqlValue>) = stmt
        .record
        .iter()
        .filter(|(col, value)| !(rowid.is_some_and(|pk| pk.name == *col) && is_zero(value)))
        .map(|(col, value)| (quote_ident(col), to_sql_value(value)))
        .unzip();

    let table = quote_ident(&schema.table);
    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES")
    } else {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        )
    };

    stmt.rows_affected = conn.execute(&sql, params_from_iter(values))?;

    if let Some(pk) = rowid {
        if stmt.record.get(&pk.name).is_none_or(is_zero) {
            stmt.record.set(pk.name.clone(), conn.last_insert_rowid());
        }
    }
    Ok(())
}

fn after_write(_: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    debug!(
        entity = %stmt.schema.name,
        operation = stmt.operation.as_str(),
        rows = stmt.rows_affected,
        "write complete"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Update
// ─────────────────────────────────────────────────────────────────────────────

fn before_update(_: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    check_fields(stmt.schema, &stmt.record)?;
    let now = now();
    if let Some(attrs) = stmt.update_attrs.as_mut() {
        check_fields(stmt.schema, attrs)?;
        stamp_if_declared(stmt.schema, attrs, UPDATED_AT_COLUMN, &now);
    } else if stmt.schema.lookup_field(UPDATED_AT_COLUMN).is_some() {
        stmt.record.set(UPDATED_AT_COLUMN, now);
    }
    Ok(())
}

fn update(session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    let schema = stmt.schema;
    let is_primary = |col: &str| schema.lookup_field(col).is_some_and(|f| f.primary_key);

    let source = stmt.update_attrs.as_ref().unwrap_or(&stmt.record);
    let (assignments, mut params): (Vec<String>, Vec<SqlValue>) = source
        .iter()
        .filter(|(col, _)| !is_primary(col))
        .map(|(col, value)| (format!("{} = ?", quote_ident(col)), to_sql_value(value)))
        .unzip();
    if assignments.is_empty() {
        debug!(entity = %schema.name, "nothing to update");
        return Ok(());
    }

    let mut filter = scoped_filter(stmt);
    let mut keyed = false;
    for pk in schema.primary_fields() {
        if let Some(value) = stmt.record.get(&pk.name).filter(|v| !is_zero(v)) {
            filter.push(Clause::eq(&pk.name, value.clone()));
            keyed = true;
        }
    }
    if !keyed && stmt.filter.is_empty() {
        return Err(StoreError::MissingWhere {
            entity: schema.name.clone(),
            operation: "update",
        });
    }

    let mut sql = format!(
        "UPDATE {} SET {}",
        quote_ident(&schema.table),
        assignments.join(", ")
    );
    if let Some((where_sql, where_params)) = filter.to_sql() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
        params.extend(bind(&where_params));
    }

    stmt.rows_affected = session.connection().execute(&sql, params_from_iter(params))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete
// ─────────────────────────────────────────────────────────────────────────────

fn before_delete(_: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    if stmt.filter.is_empty() {
        return Err(StoreError::MissingWhere {
            entity: stmt.schema.name.clone(),
            operation: "delete",
        });
    }
    Ok(())
}

fn delete(session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    let schema = stmt.schema;
    let table = quote_ident(&schema.table);
    let (where_sql, where_params) = scoped_filter(stmt).to_sql().ok_or_else(|| {
        StoreError::MissingWhere {
            entity: schema.name.clone(),
            operation: "delete",
        }
    })?;

    let (sql, mut params) = if schema.has_soft_delete() && !stmt.context.include_deleted {
        (
            format!(
                "UPDATE {table} SET {} = ? WHERE {where_sql}",
                quote_ident(DELETED_AT_COLUMN)
            ),
            vec![SqlValue::Text(now())],
        )
    } else {
        (format!("DELETE FROM {table} WHERE {where_sql}"), Vec::new())
    };
    params.extend(bind(&where_params));

    stmt.rows_affected = session.connection().execute(&sql, params_from_iter(params))?;
    debug!(entity = %schema.name, rows = stmt.rows_affected, "delete complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

fn query(session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
    let schema = stmt.schema;

    let selected: Vec<&FieldDef> = match &stmt.projection {
        Projection::All => schema.fields.iter().collect(),
        Projection::Count => Vec::new(),
        Projection::Column(name) => vec![schema.lookup_field(name).ok_or_else(|| {
            StoreError::UnknownField {
                entity: schema.name.clone(),
                field: name.clone(),
            }
        })?],
    };
    let select_list = if selected.is_empty() {
        "COUNT(*)".to_string()
    } else {
        selected
            .iter()
            .map(|f| format!("{}.{}", quote_ident(&schema.table), quote_ident(&f.name)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("SELECT {select_list} FROM {}", quote_ident(&schema.table));
    let mut params = Vec::new();
    if let Some((where_sql, where_params)) = scoped_filter(stmt).to_sql() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
        params.extend(where_params);
    }
    if !stmt.order.is_empty() {
        let terms: Vec<&str> = stmt.order.iter().map(|c| c.sql.as_str()).collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
        params.extend(stmt.order.iter().flat_map(|c| c.params.iter().cloned()));
    }
    match (stmt.limit, stmt.offset) {
        (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        (None, None) => {}
    }
    debug!(entity = %schema.name, sql = %sql, "query");

    let width = selected.len().max(1);
    let raw_rows: Vec<Vec<SqlValue>> = {
        let mut prepared = session.connection().prepare(&sql)?;
        let rows = prepared.query_map(params_from_iter(bind(&params)), |row| {
            (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<SqlValue>>>()
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    match &stmt.projection {
        Projection::All => {
            stmt.rows = raw_rows
                .into_iter()
                .map(|row| {
                    selected
                        .iter()
                        .zip(row)
                        .map(|(f, v)| -> Result<(String, Value)> {
                            Ok((f.name.clone(), from_sql_value(v, f.field_type)?))
                        })
                        .collect::<Result<Record>>()
                })
                .collect::<Result<_>>()?;
        }
        Projection::Count => {
            stmt.values = raw_rows
                .into_iter()
                .flatten()
                .map(|v| from_sql_value(v, FieldType::Integer))
                .collect::<Result<_>>()?;
        }
        Projection::Column(_) => {
            let field_type = selected[0].field_type;
            stmt.values = raw_rows
                .into_iter()
                .flatten()
                .map(|v| from_sql_value(v, field_type))
                .collect::<Result<_>>()?;
        }
    }
    Ok(())
}
