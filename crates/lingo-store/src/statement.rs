//! Statements and their building blocks.
//!
//! A [`Statement`] is built by a [`Session`](crate::Session) operation and
//! handed to every callback on the operation's chain. Callbacks before the
//! executor shape it (conditions, ordering, record stamping); the executor
//! fills in the results; callbacks after the executor read them.

use lingo_core::OperationContext;
use serde_json::Value;

use crate::record::Record;
use crate::schema::{EntitySchema, quote_ident};

/// A SQL fragment with positional (`?`) parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    /// SQL text.
    pub sql: String,
    /// Values bound to the `?` placeholders, in order.
    pub params: Vec<Value>,
}

impl Clause {
    /// A clause from raw SQL and its parameters.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `"column" = ?`.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(format!("{} = ?", quote_ident(column)), vec![value.into()])
    }

    /// `"column" IS NULL`.
    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self::new(format!("{} IS NULL", quote_ident(column)), Vec::new())
    }

    /// `"column" IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(column: &str) -> Self {
        Self::new(format!("{} IS NOT NULL", quote_ident(column)), Vec::new())
    }
}

/// Conjunction of clauses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    /// Clauses joined with `AND`.
    pub clauses: Vec<Clause>,
}

impl Filter {
    /// An empty filter (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Filter::push`].
    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.push(clause);
        self
    }

    /// Builder-style equality condition.
    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.and(Clause::eq(column, value))
    }

    /// Append a clause.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Whether the filter has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as `(a) AND (b)` with the flattened parameter list.
    ///
    /// Returns `None` for an empty filter.
    #[must_use]
    pub fn to_sql(&self) -> Option<(String, Vec<Value>)> {
        if self.clauses.is_empty() {
            return None;
        }
        let sql = self
            .clauses
            .iter()
            .map(|c| format!("({})", c.sql))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self
            .clauses
            .iter()
            .flat_map(|c| c.params.iter().cloned())
            .collect();
        Some((sql, params))
    }
}

/// Read request for [`Session::find`](crate::Session::find).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Conditions.
    pub filter: Filter,
    /// Ordering terms, most significant first.
    pub order: Vec<Clause>,
    /// Maximum rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

impl Query {
    /// A query with the given filter.
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Append an ordering term such as `"title" ASC`.
    #[must_use]
    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order.push(Clause::new(term, Vec::new()));
        self
    }

    /// Limit the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Operation kinds, one callback chain each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Insert.
    Create,
    /// Update.
    Update,
    /// Delete (soft when the entity supports it).
    Delete,
    /// Read whole records.
    Query,
    /// Read projections (counts, plucked columns).
    Row,
}

impl Operation {
    /// Lowercase name for logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
            Self::Row => "row",
        }
    }
}

/// What a read selects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every schema column, producing records.
    #[default]
    All,
    /// `COUNT(*)`.
    Count,
    /// One column, producing values.
    Column(String),
}

/// State of one operation as it moves through its callback chain.
#[derive(Debug)]
pub struct Statement<'s> {
    /// Entity being operated on.
    pub schema: &'s EntitySchema,
    /// Operation kind.
    pub operation: Operation,
    /// Per-operation flags.
    pub context: OperationContext,
    /// Conditions given by the caller.
    pub filter: Filter,
    /// Conditions added by callbacks. Applied with `filter`, but never
    /// count as a caller condition for the missing-WHERE guards.
    pub scope: Filter,
    /// Ordering terms.
    pub order: Vec<Clause>,
    /// Maximum rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Record written by create/update (the "model").
    pub record: Record,
    /// Explicit attributes of an attribute update.
    pub update_attrs: Option<Record>,
    /// Selection of a read.
    pub projection: Projection,
    /// Rows inserted, updated or deleted.
    pub rows_affected: usize,
    /// Records read by a query.
    pub rows: Vec<Record>,
    /// Values read by a row query.
    pub values: Vec<Value>,
}

impl<'s> Statement<'s> {
    /// A fresh statement with nothing filled in.
    #[must_use]
    pub fn new(schema: &'s EntitySchema, operation: Operation, context: OperationContext) -> Self {
        Self {
            schema,
            operation,
            context,
            filter: Filter::new(),
            scope: Filter::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            record: Record::new(),
            update_attrs: None,
            projection: Projection::All,
            rows_affected: 0,
            rows: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a callback condition to the statement's scope.
    pub fn add_condition(&mut self, clause: Clause) {
        self.scope.push(clause);
    }

    /// Caller conditions followed by callback conditions.
    #[must_use]
    pub fn conditions(&self) -> Filter {
        Filter {
            clauses: self
                .filter
                .clauses
                .iter()
                .chain(&self.scope.clauses)
                .cloned()
                .collect(),
        }
    }

    /// Append an ordering term.
    pub fn add_order(&mut self, clause: Clause) {
        self.order.push(clause);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
