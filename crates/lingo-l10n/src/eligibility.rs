//! Entity eligibility.
//!
//! Whether an entity participates in localization is decided from its
//! schema's capability markers and columns. The answer, together with the
//! column facts the rewriter and write coordinator need, is computed once
//! per entity name and cached.

use std::collections::HashMap;
use std::sync::Arc;

use lingo_core::LANGUAGE_CODE_COLUMN;
use lingo_store::{Capability, Clause, EntitySchema, Filter, Record, is_zero};
use parking_lot::RwLock;
use tracing::debug;

use crate::ext::AVAILABLE_LOCALES_COLUMN;

/// Localizable: the capability marker plus a `language_code` column.
#[must_use]
pub fn is_localizable(schema: &EntitySchema) -> bool {
    schema.has_capability(Capability::Localizable)
        && schema.lookup_field(LANGUAGE_CODE_COLUMN).is_some()
}

/// Locale-creatable: localizable plus the locale-creatable marker.
#[must_use]
pub fn is_locale_creatable(schema: &EntitySchema) -> bool {
    is_localizable(schema) && schema.has_capability(Capability::LocaleCreatable)
}

/// Everything the engine needs to know about one entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityTraits {
    /// Participates in localization.
    pub localizable: bool,
    /// Non-global rows may be created directly.
    pub locale_creatable: bool,
    /// The schema has a prioritized primary key.
    pub has_prioritized_key: bool,
    /// Primary columns other than `language_code`.
    pub identity_columns: Vec<String>,
    /// Columns tagged for canonical sync.
    pub sync_columns: Vec<String>,
    /// Rows are soft-deleted.
    pub soft_delete: bool,
    /// The entity stores its availability set.
    pub tracks_availability: bool,
}

impl EntityTraits {
    /// Derive the traits of `schema`.
    #[must_use]
    pub fn of(schema: &EntitySchema) -> Self {
        let localizable = is_localizable(schema);
        Self {
            localizable,
            locale_creatable: is_locale_creatable(schema),
            has_prioritized_key: schema.prioritized_primary_key().is_some(),
            identity_columns: schema
                .primary_fields()
                .filter(|f| f.name != LANGUAGE_CODE_COLUMN)
                .map(|f| f.name.clone())
                .collect(),
            sync_columns: schema.sync_columns().into_iter().map(String::from).collect(),
            soft_delete: schema.has_soft_delete(),
            tracks_availability: localizable
                && schema.has_capability(Capability::AvailableLocales)
                && schema.lookup_field(AVAILABLE_LOCALES_COLUMN).is_some(),
        }
    }

    /// Equality conditions on the identity columns of `record`.
    ///
    /// `None` when the entity has no identity columns or any of them is
    /// unset on the record.
    #[must_use]
    pub fn identity_filter(&self, record: &Record) -> Option<Filter> {
        if self.identity_columns.is_empty() {
            return None;
        }
        let mut filter = Filter::new();
        for column in &self.identity_columns {
            let value = record.get(column).filter(|v| !is_zero(v))?;
            filter.push(Clause::eq(column, value.clone()));
        }
        Some(filter)
    }
}

/// Per-entity cache of [`EntityTraits`].
///
/// Keyed by entity name: two different schemas sharing a name share an
/// entry.
#[derive(Debug, Default)]
pub struct Classifier {
    cache: RwLock<HashMap<String, Arc<EntityTraits>>>,
}

impl Classifier {
    /// An empty classifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Traits of `schema`, computed on first use.
    pub fn classify(&self, schema: &EntitySchema) -> Arc<EntityTraits> {
        if let Some(traits) = self.cache.read().get(&schema.name) {
            return Arc::clone(traits);
        }
        let mut cache = self.cache.write();
        let traits = cache.entry(schema.name.clone()).or_insert_with(|| {
            let traits = EntityTraits::of(schema);
            debug!(entity = %schema.name, ?traits, "classified entity");
            Arc::new(traits)
        });
        Arc::clone(traits)
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether nothing has been classified yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
