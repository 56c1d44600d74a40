//! Write coordination.
//!
//! The `before_*` callbacks stamp locales and add locale conditions; the
//! post-write pass materializes missing locale rows and pushes sync columns
//! to the other variants of the written identity.

use lingo_core::{LANGUAGE_CODE_COLUMN, OperationContext, OperationMode};
use lingo_store::{
    Clause, DELETED_AT_COLUMN, Filter, Record, Session, Statement, StoreError, quote_ident,
};
use serde_json::Value;
use tracing::debug;

use crate::availability;
use crate::callbacks::BEFORE_CREATE;
use crate::eligibility::EntityTraits;
use crate::engine::Localization;
use crate::errors::LocalizationError;
use crate::ext::LocaleRecordExt;
use crate::locale_context::{resolve_query_locale, resolve_write_locale};
use crate::rewriter::{RewriteInput, rewrite};

/// `"table"."language_code" = ?`.
fn locale_condition(table: &str, locale: &str) -> Clause {
    Clause::new(
        format!("{}.{} = ?", quote_ident(table), quote_ident(LANGUAGE_CODE_COLUMN)),
        vec![Value::from(locale)],
    )
}

impl Localization {
    pub(crate) fn before_query(
        &self,
        _: &Session<'_>,
        stmt: &mut Statement<'_>,
    ) -> lingo_store::Result<()> {
        let traits = self.classifier.classify(stmt.schema);
        if !traits.localizable {
            return Ok(());
        }
        let locale = resolve_query_locale(&stmt.context, &self.global);
        let mode = self.mode(&stmt.context);
        let out = rewrite(&RewriteInput {
            table: &stmt.schema.table,
            identity_columns: &traits.identity_columns,
            mode,
            locale: &locale,
            global: &self.global,
            soft_delete: traits.soft_delete,
            include_deleted: stmt.context.include_deleted,
        });
        debug!(
            entity = %stmt.schema.name,
            %mode,
            locale = %locale.code,
            conditions = out.conditions.len(),
            "scoping read"
        );
        for clause in out.conditions {
            stmt.add_condition(clause);
        }
        for clause in out.order {
            stmt.add_order(clause);
        }
        Ok(())
    }

    pub(crate) fn before_create(
        &self,
        session: &Session<'_>,
        stmt: &mut Statement<'_>,
    ) -> lingo_store::Result<()> {
        let traits = self.classifier.classify(stmt.schema);
        if !traits.localizable {
            return Ok(());
        }
        let locale = resolve_write_locale(&stmt.context, &self.global);
        if locale.is_specific && !traits.locale_creatable && traits.has_prioritized_key {
            return Err(LocalizationError::CreationRejected {
                entity: stmt.schema.name.clone(),
                locale: locale.code,
            }
            .into_callback(BEFORE_CREATE));
        }

        availability::recompute(session, stmt.schema, &traits, &mut stmt.record, Some(&locale.code))?;
        debug!(entity = %stmt.schema.name, locale = %locale.code, "stamping locale on create");
        stmt.record.set_locale(&locale.code);
        Ok(())
    }

    pub(crate) fn before_update(
        &self,
        session: &Session<'_>,
        stmt: &mut Statement<'_>,
    ) -> lingo_store::Result<()> {
        let traits = self.classifier.classify(stmt.schema);
        if !traits.localizable {
            return Ok(());
        }
        // the locale condition below must not stand in for a missing key
        if stmt.filter.is_empty()
            && !traits.identity_columns.is_empty()
            && traits.identity_filter(&stmt.record).is_none()
        {
            return Err(StoreError::MissingWhere {
                entity: stmt.schema.name.clone(),
                operation: "update",
            });
        }
        let locale = resolve_write_locale(&stmt.context, &self.global);
        availability::recompute(session, stmt.schema, &traits, &mut stmt.record, None)?;

        if self.mode(&stmt.context) != OperationMode::Unscoped {
            stmt.add_condition(locale_condition(&stmt.schema.table, &locale.code));
            stmt.record.set_locale(&locale.code);
            debug!(entity = %stmt.schema.name, locale = %locale.code, "scoping update");
        }
        Ok(())
    }

    pub(crate) fn before_delete(
        &self,
        _: &Session<'_>,
        stmt: &mut Statement<'_>,
    ) -> lingo_store::Result<()> {
        if !self.classifier.classify(stmt.schema).localizable {
            return Ok(());
        }
        let locale = resolve_query_locale(&stmt.context, &self.global);
        if locale.is_specific {
            stmt.add_condition(locale_condition(&stmt.schema.table, &locale.code));
            debug!(entity = %stmt.schema.name, locale = %locale.code, "scoping delete");
        }
        Ok(())
    }

    /// Post-write reconciliation, shared by `after_create` and `after_update`.
    pub(crate) fn after_write(
        &self,
        name: &str,
        session: &Session<'_>,
        stmt: &mut Statement<'_>,
    ) -> lingo_store::Result<()> {
        let traits = self.classifier.classify(stmt.schema);
        if !traits.localizable {
            return Ok(());
        }
        let locale = resolve_write_locale(&stmt.context, &self.global);

        if locale.is_specific && stmt.rows_affected == 0 && !traits.has_prioritized_key {
            materialize(session, stmt, &traits, &locale.code)?;
        }

        if !traits.sync_columns.is_empty()
            && self.mode(&stmt.context) != OperationMode::Unscoped
            && stmt.rows_affected > 0
        {
            propagate(name, session, stmt, &traits, &locale.code)?;
        }
        Ok(())
    }
}

/// Create the missing `(identity, locale)` row from the in-memory record.
///
/// Soft-deleted rows for the pair are purged first. The existence check and
/// the insert are not atomic.
fn materialize(
    session: &Session<'_>,
    stmt: &mut Statement<'_>,
    traits: &EntityTraits,
    locale: &str,
) -> lingo_store::Result<()> {
    let mut filter = match traits.identity_filter(&stmt.record) {
        Some(filter) => filter,
        None if traits.identity_columns.is_empty() => Filter::new(),
        None => {
            debug!(entity = %stmt.schema.name, "record has no identity, not materializing");
            return Ok(());
        }
    };
    filter.push(Clause::eq(LANGUAGE_CODE_COLUMN, locale));

    let unscoped = OperationContext::new().with_mode(OperationMode::Unscoped);
    if traits.soft_delete {
        let purge = filter.clone().and(Clause::is_not_null(DELETED_AT_COLUMN));
        let purged = session.delete(stmt.schema, &unscoped.clone().including_deleted(), purge)?;
        debug!(entity = %stmt.schema.name, purged, "purged soft-deleted locale rows");
    }

    if session.count(stmt.schema, &unscoped, filter)? > 0 {
        return Ok(());
    }

    let mut copy = stmt.record.clone();
    if let Some(attrs) = &stmt.update_attrs {
        for (column, value) in attrs.iter() {
            copy.set(column, value.clone());
        }
    }
    let _ = copy.remove(DELETED_AT_COLUMN);
    debug!(entity = %stmt.schema.name, %locale, "materializing locale row");
    stmt.rows_affected = session.create(stmt.schema, &stmt.context, &mut copy)?;
    stmt.record = copy;
    Ok(())
}

/// Push sync-column values to every other variant of the identity.
fn propagate(
    name: &str,
    session: &Session<'_>,
    stmt: &Statement<'_>,
    traits: &EntityTraits,
    locale: &str,
) -> lingo_store::Result<()> {
    let is_sync = |column: &str| traits.sync_columns.iter().any(|s| s == column);
    let values: Record = match &stmt.update_attrs {
        Some(attrs) => attrs
            .iter()
            .filter(|(column, _)| is_sync(column))
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect(),
        None => traits
            .sync_columns
            .iter()
            .filter_map(|column| stmt.record.get(column).map(|v| (column.clone(), v.clone())))
            .collect(),
    };
    if values.is_empty() {
        return Ok(());
    }

    let Some(mut filter) = traits.identity_filter(&stmt.record) else {
        debug!(entity = %stmt.schema.name, "record has no identity, skipping propagation");
        return Ok(());
    };
    filter.push(Clause::new(
        format!("{} <> ?", quote_ident(LANGUAGE_CODE_COLUMN)),
        vec![Value::from(locale)],
    ));

    let rows = session
        .raw()
        .and_then(|raw| raw.update_columns(&stmt.schema.table, &filter, &values))
        .map_err(|source| {
            LocalizationError::PropagationFailed {
                entity: stmt.schema.name.clone(),
                source,
            }
            .into_callback(name)
        })?;
    debug!(entity = %stmt.schema.name, rows, columns = values.len(), "propagated sync columns");
    Ok(())
}
