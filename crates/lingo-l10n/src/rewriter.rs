//! Query rewriting.
//!
//! [`rewrite`] turns an operation mode and a resolved locale into the
//! conditions and ordering terms a read gets. It is pure: the `before_query`
//! callback feeds it the statement's facts and appends the result.
//!
//! Identity is compared with a correlated `NOT EXISTS` over the identity
//! columns, against the same table aliased `t2`. The outer table is always
//! referenced by its quoted name so the fragments also work inside
//! `UPDATE` and `DELETE`.

use lingo_core::{LANGUAGE_CODE_COLUMN, OperationMode, ResolvedLocale};
use lingo_store::{Clause, DELETED_AT_COLUMN, quote_ident};
use serde_json::Value;

/// Facts the rewriter needs about one read.
#[derive(Clone, Copy, Debug)]
pub struct RewriteInput<'a> {
    /// Table name (unquoted).
    pub table: &'a str,
    /// Primary columns other than `language_code`.
    pub identity_columns: &'a [String],
    /// Effective mode.
    pub mode: OperationMode,
    /// Resolved query locale.
    pub locale: &'a ResolvedLocale,
    /// The global locale.
    pub global: &'a str,
    /// The entity soft-deletes rows.
    pub soft_delete: bool,
    /// The operation includes soft-deleted rows.
    pub include_deleted: bool,
}

/// Conditions and ordering terms to append to a read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rewrite {
    /// Conditions, each ANDed onto the statement.
    pub conditions: Vec<Clause>,
    /// Ordering terms appended after the caller's.
    pub order: Vec<Clause>,
}

/// Compute the rewrite for one read.
#[must_use]
pub fn rewrite(input: &RewriteInput<'_>) -> Rewrite {
    let table = quote_ident(input.table);
    let column = format!("{table}.{}", quote_ident(LANGUAGE_CODE_COLUMN));
    let global = Value::from(input.global);
    let locale = Value::from(input.locale.code.as_str());

    let mut out = Rewrite::default();
    match input.mode {
        OperationMode::Unscoped => {}
        OperationMode::Global => {
            out.conditions.push(Clause::new(format!("{column} = ?"), vec![global]));
        }
        OperationMode::Locale => {
            out.conditions.push(Clause::new(format!("{column} = ?"), vec![locale]));
        }
        OperationMode::Reverse => {
            out.conditions.push(canonical_without_variant(input, &table, &column));
        }
        OperationMode::Fallback if input.locale.is_specific => {
            let missing = canonical_without_variant(input, &table, &column);
            let mut params = missing.params;
            params.push(locale.clone());
            out.conditions.push(Clause::new(
                format!("({}) OR {column} = ?", missing.sql),
                params,
            ));
            out.order
                .push(Clause::new(format!("{column} = ? DESC"), vec![locale]));
        }
        OperationMode::Fallback => {
            out.conditions.push(Clause::new(format!("{column} = ?"), vec![global]));
        }
    }
    out
}

/// Canonical rows with no live row in the requested locale.
fn canonical_without_variant(input: &RewriteInput<'_>, table: &str, column: &str) -> Clause {
    let global = Value::from(input.global);
    // nothing to correlate on, so every canonical row counts as lacking a
    // variant and fallback shows it beside the locale rows
    if input.identity_columns.is_empty() {
        return Clause::new(format!("{column} = ?"), vec![global]);
    }

    let mut inner: Vec<String> = input
        .identity_columns
        .iter()
        .map(|c| {
            let c = quote_ident(c);
            format!("t2.{c} = {table}.{c}")
        })
        .collect();
    inner.push(format!("t2.{} = ?", quote_ident(LANGUAGE_CODE_COLUMN)));
    if input.soft_delete && !input.include_deleted {
        inner.push(format!("t2.{} IS NULL", quote_ident(DELETED_AT_COLUMN)));
    }

    Clause::new(
        format!(
            "{column} = ? AND NOT EXISTS (SELECT 1 FROM {table} AS t2 WHERE {})",
            inner.join(" AND ")
        ),
        vec![global, Value::from(input.locale.code.as_str())],
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
