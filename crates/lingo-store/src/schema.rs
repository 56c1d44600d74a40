//! Entity schemas.
//!
//! An [`EntitySchema`] is the host's description of one persisted record
//! type: its table, its columns, which columns form the primary key, which
//! columns are tagged for canonical sync, and which capability markers the
//! type opts into. Extensions read capabilities instead of probing records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Column holding the soft-delete marker.
pub const DELETED_AT_COLUMN: &str = "deleted_at";
/// Column stamped on insert.
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Column stamped on insert and update.
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Quote an identifier for `SQLite`.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 64-bit integer.
    Integer,
    /// Floating point.
    Real,
    /// UTF-8 text.
    Text,
    /// Boolean stored as 0/1.
    Bool,
    /// RFC 3339 timestamp stored as text.
    Timestamp,
    /// Array of strings stored as JSON text.
    StringArray,
    /// Arbitrary JSON stored as text.
    Json,
}

impl FieldType {
    /// Declared `SQLite` column type.
    #[must_use]
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Bool => "INTEGER",
            Self::Real => "REAL",
            Self::Text | Self::Timestamp | Self::StringArray | Self::Json => "TEXT",
        }
    }
}

/// One column of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub field_type: FieldType,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Canonical value is pushed to every locale variant on write.
    #[serde(default)]
    pub sync: bool,
}

impl FieldDef {
    /// A plain column.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            sync: false,
        }
    }

    /// Shorthand for an integer column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Shorthand for a text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Shorthand for a real column.
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Real)
    }

    /// Shorthand for a boolean column.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    /// Shorthand for a timestamp column.
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Shorthand for a string-array column.
    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::StringArray)
    }

    /// Mark the column as part of the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Tag the column for canonical sync.
    #[must_use]
    pub fn synced(mut self) -> Self {
        self.sync = true;
        self
    }
}

/// Capability markers an entity type can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Rows are scoped by `language_code`.
    Localizable,
    /// Non-global rows may be created directly.
    LocaleCreatable,
    /// The entity records which locales it exists in.
    AvailableLocales,
}

/// Describes an entity type's table, columns, and capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Type name used in logs and errors (e.g. `Article`).
    pub name: String,
    /// Table name.
    pub table: String,
    /// Columns in declaration order.
    pub fields: Vec<FieldDef>,
    /// Capability markers.
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

impl EntitySchema {
    /// An entity with no columns yet.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Add a column. A column of the same name is replaced in place.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
        self
    }

    /// Add a capability marker.
    #[must_use]
    pub fn capability(mut self, capability: Capability) -> Self {
        let _ = self.capabilities.insert(capability);
        self
    }

    /// Add the soft-delete marker column.
    #[must_use]
    pub fn soft_delete(self) -> Self {
        self.field(FieldDef::timestamp(DELETED_AT_COLUMN))
    }

    /// Whether the capability marker is present.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Look up a column by name.
    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Columns flagged as primary key, in declaration order.
    pub fn primary_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// The primary column that identifies a row on its own.
    ///
    /// The primary column named `id` wins; otherwise the only primary
    /// column; otherwise none (composite keys without an `id`).
    #[must_use]
    pub fn prioritized_primary_key(&self) -> Option<&FieldDef> {
        if let Some(id) = self.primary_fields().find(|f| f.name == "id") {
            return Some(id);
        }
        let mut primaries = self.primary_fields();
        match (primaries.next(), primaries.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Whether rows are soft-deleted.
    #[must_use]
    pub fn has_soft_delete(&self) -> bool {
        self.lookup_field(DELETED_AT_COLUMN).is_some()
    }

    /// Columns tagged for canonical sync.
    #[must_use]
    pub fn sync_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.sync)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for the schema.
    ///
    /// A lone integer primary column becomes the rowid alias; composite keys
    /// get a table-level `PRIMARY KEY` constraint.
    #[must_use]
    pub fn create_table_sql(&self) -> String {
        let primaries: Vec<&FieldDef> = self.primary_fields().collect();
        let rowid_alias = matches!(
            primaries.as_slice(),
            [only] if only.field_type == FieldType::Integer
        );

        let mut columns: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let mut col = format!("{} {}", quote_ident(&f.name), f.field_type.sql_type());
                if rowid_alias && f.primary_key {
                    col.push_str(" PRIMARY KEY");
                }
                col
            })
            .collect();

        if !rowid_alias && !primaries.is_empty() {
            let keys: Vec<String> = primaries.iter().map(|f| quote_ident(&f.name)).collect();
            columns.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            columns.join(", ")
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
