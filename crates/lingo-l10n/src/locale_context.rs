//! Locale resolution for one operation.

use lingo_core::{OperationContext, ResolvedLocale};

/// Locale rows are read (and deleted) in.
///
/// Unset or empty means the global locale.
#[must_use]
pub fn resolve_query_locale(ctx: &OperationContext, global: &str) -> ResolvedLocale {
    ctx.query_locale()
        .map_or_else(|| ResolvedLocale::global(global), |code| ResolvedLocale::new(code, global))
}

/// Locale writes target: the "localize to" locale, else the query locale.
#[must_use]
pub fn resolve_write_locale(ctx: &OperationContext, global: &str) -> ResolvedLocale {
    match ctx.write_locale() {
        Some(code) => ResolvedLocale::new(code, global),
        None => resolve_query_locale(ctx, global),
    }
}
