//! # lingo-core
//!
//! Shared vocabulary for the lingo localization engine.
//!
//! - **Locales**: the global locale default, locale-code validation, and
//!   [`ResolvedLocale`] (a locale plus whether it targets a variant row)
//! - **Operation context**: [`OperationMode`] and the typed
//!   [`OperationContext`] threaded through every store statement
//! - **Settings**: [`LingoSettings`] loaded from defaults, a JSON file, and
//!   `LINGO_*` environment overrides
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod locale;
pub mod logging;
pub mod settings;

pub use context::{OperationContext, OperationMode};
pub use errors::{CoreError, Result, SettingsError};
pub use locale::{DEFAULT_GLOBAL_LOCALE, LANGUAGE_CODE_COLUMN, ResolvedLocale, validate_locale_code};
pub use settings::{DatabaseSettings, LingoSettings, load_settings, load_settings_from_path};
