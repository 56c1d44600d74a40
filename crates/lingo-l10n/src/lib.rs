//! # lingo-l10n
//!
//! Row-level localization for `lingo-store` entities.
//!
//! Entities opt in with capability markers (see [`LocalizableSchemaExt`]).
//! Once [`Localization::register`] has installed its callbacks on a
//! [`Client`](lingo_store::Client), every operation on a localizable entity
//! is scoped by the locale and mode carried on its
//! [`OperationContext`](lingo_core::OperationContext):
//!
//! - **[`locale_context`]**: the read and write locales of an operation
//! - **[`eligibility`]**: which entities participate, cached per entity
//! - **[`rewriter`]**: mode-specific read conditions and ordering
//! - **[`writer`]**: locale stamping, update/delete scoping, lazy locale
//!   materialization, and canonical sync-column propagation
//! - **[`availability`]**: the per-entity list of locales a row exists in
//! - **[`localize`]**: copying a row into other locales

#![deny(unsafe_code)]

pub mod availability;
pub mod callbacks;
pub mod eligibility;
pub mod engine;
pub mod errors;
pub mod ext;
pub mod locale_context;
pub mod localize;
pub mod rewriter;
pub mod writer;

pub use eligibility::{Classifier, EntityTraits, is_locale_creatable, is_localizable};
pub use engine::Localization;
pub use errors::{LocalizationError, Result};
pub use ext::{AVAILABLE_LOCALES_COLUMN, LocaleRecordExt, LocalizableSchemaExt};
pub use locale_context::{resolve_query_locale, resolve_write_locale};
pub use localize::LocalizeRequest;
pub use rewriter::{Rewrite, RewriteInput, rewrite};
