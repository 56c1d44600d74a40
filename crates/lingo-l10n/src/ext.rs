//! Schema and record helpers for localizable entities.

use lingo_core::LANGUAGE_CODE_COLUMN;
use lingo_store::{Capability, EntitySchema, FieldDef, Record};
use serde_json::Value;

/// Column storing the availability set.
pub const AVAILABLE_LOCALES_COLUMN: &str = "language_available_code";

/// Builder helpers that opt a schema into localization.
pub trait LocalizableSchemaExt: Sized {
    /// Add the `language_code` primary column and the localizable marker.
    #[must_use]
    fn localizable(self) -> Self;

    /// The locale-creatable marker. Implies
    /// [`LocalizableSchemaExt::localizable`], which is applied only when the
    /// schema is not localizable yet.
    #[must_use]
    fn locale_creatable(self) -> Self;

    /// Add the availability column (synced) and its marker.
    #[must_use]
    fn tracking_available_locales(self) -> Self;
}

impl LocalizableSchemaExt for EntitySchema {
    fn localizable(self) -> Self {
        self.field(FieldDef::text(LANGUAGE_CODE_COLUMN).primary())
            .capability(Capability::Localizable)
    }

    fn locale_creatable(self) -> Self {
        let schema = if self.has_capability(Capability::Localizable) {
            self
        } else {
            self.localizable()
        };
        schema.capability(Capability::LocaleCreatable)
    }

    fn tracking_available_locales(self) -> Self {
        self.field(FieldDef::string_array(AVAILABLE_LOCALES_COLUMN).synced())
            .capability(Capability::AvailableLocales)
    }
}

/// Locale accessors on records of localizable entities.
pub trait LocaleRecordExt {
    /// The row's locale, if set.
    fn language_code(&self) -> Option<&str>;

    /// Whether the row is the canonical one.
    fn is_global(&self, global: &str) -> bool;

    /// Stamp the row's locale.
    fn set_locale(&mut self, code: &str);

    /// The stored availability set (empty when absent).
    fn available_locales(&self) -> Vec<String>;
}

impl LocaleRecordExt for Record {
    fn language_code(&self) -> Option<&str> {
        self.get_str(LANGUAGE_CODE_COLUMN)
    }

    fn is_global(&self, global: &str) -> bool {
        self.language_code() == Some(global)
    }

    fn set_locale(&mut self, code: &str) {
        self.set(LANGUAGE_CODE_COLUMN, code);
    }

    fn available_locales(&self) -> Vec<String> {
        match self.get(AVAILABLE_LOCALES_COLUMN) {
            Some(Value::Array(codes)) => codes
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }
}
