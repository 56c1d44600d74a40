//! The localization engine handle.

use std::sync::Arc;

use lingo_core::{
    DEFAULT_GLOBAL_LOCALE, LingoSettings, OperationContext, OperationMode, validate_locale_code,
};
use lingo_store::Client;

use crate::callbacks;
use crate::eligibility::Classifier;
use crate::errors::Result;

/// Global locale, default mode, and the eligibility cache.
///
/// Cheap to clone; registered callbacks hold clones.
#[derive(Clone, Debug)]
pub struct Localization {
    pub(crate) global: String,
    pub(crate) default_mode: OperationMode,
    pub(crate) classifier: Arc<Classifier>,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            global: DEFAULT_GLOBAL_LOCALE.to_string(),
            default_mode: OperationMode::default(),
            classifier: Arc::new(Classifier::new()),
        }
    }
}

impl Localization {
    /// An engine with the given global locale and default mode.
    pub fn new(global: impl Into<String>, default_mode: OperationMode) -> Result<Self> {
        let global = global.into();
        validate_locale_code(&global)?;
        Ok(Self {
            global,
            default_mode,
            ..Self::default()
        })
    }

    /// An engine configured from loaded settings.
    pub fn from_settings(settings: &LingoSettings) -> Result<Self> {
        Self::new(settings.global_locale.clone(), settings.default_mode)
    }

    /// The canonical locale.
    #[must_use]
    pub fn global(&self) -> &str {
        &self.global
    }

    /// Mode used when an operation does not set one.
    #[must_use]
    pub fn default_mode(&self) -> OperationMode {
        self.default_mode
    }

    /// The eligibility cache.
    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Install the `l10n:*` callbacks on `client`. Safe to call repeatedly.
    pub fn register(&self, client: &mut Client) -> lingo_store::Result<()> {
        callbacks::register(self, client.callbacks_mut())
    }

    /// Effective mode of `ctx`.
    pub(crate) fn mode(&self, ctx: &OperationContext) -> OperationMode {
        ctx.mode_or(self.default_mode)
    }
}
