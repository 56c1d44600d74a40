//! # lingo-store
//!
//! A small `SQLite` persistence client with named callback chains.
//!
//! The client is the host the localization engine plugs into:
//!
//! - **[`connection`]**: `r2d2` connection pool with pragmas applied to
//!   every connection
//! - **[`schema`]**: [`EntitySchema`] declares table, fields, primary keys,
//!   field-level sync flags, and entity [`Capability`] markers
//! - **[`record`]**: [`Record`], a column-name → JSON value map, plus the
//!   JSON ↔ `SQLite` value conversions
//! - **[`statement`]**: [`Statement`] is what callbacks see and mutate
//!   (filter, ordering, record, update attributes, rows affected)
//! - **[`callbacks`]**: per-operation ordered chains of named callbacks
//! - **[`session`]**: [`Client`] and [`Session`], the hooked operations
//! - **[`raw`]**: [`RawSession`], a hook-free handle on its own connection
//!
//! ## Default chains
//!
//! | operation | callbacks |
//! |-----------|-----------|
//! | create | `store:before_create`, `store:create`, `store:after_create` |
//! | update | `store:before_update`, `store:update`, `store:after_update` |
//! | delete | `store:before_delete`, `store:delete` |
//! | query  | `store:query` |
//! | row    | `store:row_query` |
//!
//! Extensions register their own callbacks relative to these names.

#![deny(unsafe_code)]

pub mod callbacks;
pub mod connection;
pub mod errors;
mod executor;
pub mod raw;
pub mod record;
pub mod schema;
pub mod session;
pub mod statement;

pub use callbacks::{Callback, Callbacks, Position, Processor};
pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use errors::{Result, StoreError};
pub use raw::RawSession;
pub use record::{Record, from_sql_value, is_zero, to_sql_value};
pub use schema::{
    CREATED_AT_COLUMN, Capability, DELETED_AT_COLUMN, EntitySchema, FieldDef, FieldType,
    UPDATED_AT_COLUMN, quote_ident,
};
pub use session::{Client, Session};
pub use statement::{Clause, Filter, Operation, Projection, Query, Statement};
