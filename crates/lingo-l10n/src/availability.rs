//! Availability sets.
//!
//! Entities that track availability store, on every row, the list of
//! locales their identity exists in. The list is rebuilt from the store on
//! each write and, being a sync column, pushed to every variant.

use lingo_core::{LANGUAGE_CODE_COLUMN, OperationContext, OperationMode};
use lingo_store::{EntitySchema, Record, Session};
use serde_json::Value;
use tracing::debug;

use crate::eligibility::EntityTraits;
use crate::ext::AVAILABLE_LOCALES_COLUMN;

/// Rebuild the availability set on `record`.
///
/// Plucks `language_code` for the record's identity (live rows only, no
/// locale scoping) and appends `additional` when non-empty. Duplicates and
/// store order are kept. No-op for entities that do not track availability.
pub fn recompute(
    session: &Session<'_>,
    schema: &EntitySchema,
    traits: &EntityTraits,
    record: &mut Record,
    additional: Option<&str>,
) -> lingo_store::Result<()> {
    if !traits.tracks_availability {
        return Ok(());
    }

    let mut codes = match traits.identity_filter(record) {
        Some(filter) => {
            let ctx = OperationContext::new().with_mode(OperationMode::Unscoped);
            session.pluck(schema, &ctx, LANGUAGE_CODE_COLUMN, filter)?
        }
        None => Vec::new(),
    };
    if let Some(code) = additional.filter(|c| !c.is_empty()) {
        codes.push(Value::from(code));
    }

    debug!(entity = %schema.name, locales = ?codes, "availability recomputed");
    record.set(AVAILABLE_LOCALES_COLUMN, Value::Array(codes));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::{LocalizableSchemaExt, LocaleRecordExt};
    use lingo_store::{Client, ConnectionConfig, FieldDef, new_in_memory};

    fn post() -> EntitySchema {
        EntitySchema::new("Post", "posts")
            .field(FieldDef::integer("id").primary())
            .field(FieldDef::text("title"))
            .locale_creatable()
            .tracking_available_locales()
            .soft_delete()
    }

    fn seeded() -> Client {
        let client = Client::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap();
        client.migrate(&post()).unwrap();
        let raw = client.raw().unwrap();
        for (lang, deleted) in [("en-US", false), ("fr-FR", false), ("de-DE", true)] {
            let deleted_at = deleted.then_some("2024-01-01T00:00:00Z");
            raw.execute(
                "INSERT INTO posts (id, language_code, title, deleted_at) VALUES (1, ?, 't', ?)",
                &[Value::from(lang), Value::from(deleted_at)],
            )
            .unwrap();
        }
        client
    }

    #[test]
    fn plucks_live_locales_and_appends() {
        let client = seeded();
        let session = client.session().unwrap();
        let schema = post();
        let traits = EntityTraits::of(&schema);
        let mut record = Record::new().with("id", 1);
        recompute(&session, &schema, &traits, &mut record, Some("fr-FR")).unwrap();
        assert_eq!(record.available_locales(), vec!["en-US", "fr-FR", "fr-FR"]);
    }

    #[test]
    fn without_identity_only_additional() {
        let client = seeded();
        let session = client.session().unwrap();
        let schema = post();
        let traits = EntityTraits::of(&schema);
        let mut record = Record::new();
        recompute(&session, &schema, &traits, &mut record, Some("en-US")).unwrap();
        assert_eq!(record.available_locales(), vec!["en-US"]);
    }

    #[test]
    fn empty_additional_is_ignored() {
        let client = seeded();
        let session = client.session().unwrap();
        let schema = post();
        let traits = EntityTraits::of(&schema);
        let mut record = Record::new().with("id", 1);
        recompute(&session, &schema, &traits, &mut record, Some("")).unwrap();
        assert_eq!(record.available_locales(), vec!["en-US", "fr-FR"]);
    }

    #[test]
    fn untracked_entities_are_left_alone() {
        let client = seeded();
        let session = client.session().unwrap();
        let schema = EntitySchema::new("Plain", "posts")
            .field(FieldDef::integer("id").primary())
            .localizable();
        let traits = EntityTraits::of(&schema);
        let mut record = Record::new().with("id", 1);
        recompute(&session, &schema, &traits, &mut record, Some("fr-FR")).unwrap();
        assert!(!record.contains(AVAILABLE_LOCALES_COLUMN));
    }
}
