//! Localize action: copy one locale's row into other locales.

use lingo_core::{OperationContext, OperationMode};
use lingo_store::{
    CREATED_AT_COLUMN, Clause, EntitySchema, Filter, Query, Record, Session, UPDATED_AT_COLUMN,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::engine::Localization;
use crate::errors::{LocalizationError, Result};

/// Source and target locales of a localize action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizeRequest {
    /// Locale to copy from.
    pub from: String,
    /// Locales to create.
    pub to: Vec<String>,
}

impl Localization {
    /// Create a copy of the `from` row of `identity` in every `to` locale.
    ///
    /// Targets equal to `from` are skipped. Returns the number of rows
    /// created. Rows go through the hooked create path, so non-creatable
    /// entities reject non-global targets.
    #[instrument(skip_all, fields(entity = %schema.name, from = %request.from))]
    pub fn localize(
        &self,
        session: &Session<'_>,
        schema: &EntitySchema,
        identity: &Record,
        request: &LocalizeRequest,
    ) -> Result<usize> {
        let traits = self.classifier.classify(schema);
        if !traits.localizable {
            return Err(LocalizationError::NotLocalizable(schema.name.clone()));
        }

        let mut filter = Filter::new();
        for column in &traits.identity_columns {
            let value = identity.get(column).ok_or_else(|| LocalizationError::MissingIdentity {
                entity: schema.name.clone(),
                column: column.clone(),
            })?;
            filter.push(Clause::eq(column, value.clone()));
        }

        let mode = if request.from == self.global {
            OperationMode::Global
        } else {
            OperationMode::Locale
        };
        let read = OperationContext::new()
            .with_mode(mode)
            .with_locale(request.from.clone());
        let source = session
            .first(schema, &read, &Query::new(filter))?
            .ok_or_else(|| LocalizationError::SourceNotFound {
                entity: schema.name.clone(),
                locale: request.from.clone(),
            })?;

        let mut created = 0;
        for target in request.to.iter().filter(|t| **t != request.from) {
            let mut copy = source.clone();
            let _ = copy.remove(CREATED_AT_COLUMN);
            let _ = copy.remove(UPDATED_AT_COLUMN);
            let write = OperationContext::new().localize_to(target.clone());
            created += session.create(schema, &write, &mut copy)?;
            debug!(%target, "localized row");
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::LocalizableSchemaExt;
    use assert_matches::assert_matches;
    use lingo_store::{Client, ConnectionConfig, FieldDef, new_in_memory};

    fn setup() -> (Client, Localization, EntitySchema) {
        let mut client = Client::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap();
        let l10n = Localization::default();
        l10n.register(&mut client).unwrap();
        let schema = EntitySchema::new("Page", "pages")
            .field(FieldDef::integer("id").primary())
            .field(FieldDef::text("title"))
            .locale_creatable();
        client.migrate(&schema).unwrap();
        (client, l10n, schema)
    }

    #[test]
    fn request_deserializes() {
        let request: LocalizeRequest =
            serde_json::from_str(r#"{"from": "en-US", "to": ["fr-FR"]}"#).unwrap();
        assert_eq!(request.to, vec!["fr-FR"]);
    }

    #[test]
    fn missing_identity_is_reported() {
        let (client, l10n, schema) = setup();
        let session = client.session().unwrap();
        let request = LocalizeRequest {
            from: "en-US".into(),
            to: vec!["fr-FR".into()],
        };
        assert_matches!(
            l10n.localize(&session, &schema, &Record::new(), &request),
            Err(LocalizationError::MissingIdentity { column, .. }) if column == "id"
        );
    }

    #[test]
    fn missing_source_is_reported() {
        let (client, l10n, schema) = setup();
        let session = client.session().unwrap();
        let request = LocalizeRequest {
            from: "en-US".into(),
            to: vec!["fr-FR".into()],
        };
        assert_matches!(
            l10n.localize(&session, &schema, &Record::new().with("id", 9), &request),
            Err(LocalizationError::SourceNotFound { .. })
        );
    }

    #[test]
    fn non_localizable_entity_is_refused() {
        let (client, l10n, _) = setup();
        let session = client.session().unwrap();
        let plain = EntitySchema::new("Plain", "plain").field(FieldDef::integer("id").primary());
        assert_matches!(
            l10n.localize(&session, &plain, &Record::new(), &LocalizeRequest::default()),
            Err(LocalizationError::NotLocalizable(_))
        );
    }

    #[test]
    fn copies_into_each_target() {
        let (client, l10n, schema) = setup();
        let session = client.session().unwrap();
        let mut page = Record::new().with("id", 1).with("title", "Home");
        let _ = session.create(&schema, &OperationContext::new(), &mut page).unwrap();

        let request = LocalizeRequest {
            from: "en-US".into(),
            to: vec!["en-US".into(), "fr-FR".into(), "de-DE".into()],
        };
        let created = l10n
            .localize(&session, &schema, &Record::new().with("id", 1), &request)
            .unwrap();
        assert_eq!(created, 2);

        let unscoped = OperationContext::new().with_mode(OperationMode::Unscoped);
        assert_eq!(session.count(&schema, &unscoped, Filter::new()).unwrap(), 3);
    }
}
