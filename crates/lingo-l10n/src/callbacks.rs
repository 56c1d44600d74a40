//! Callback registration.
//!
//! | name | chain | position |
//! |------|-------|----------|
//! | `l10n:before_create` | create | before `store:before_create` |
//! | `l10n:after_create` | create | before `store:after_create` |
//! | `l10n:before_update` | update | before `store:before_update` |
//! | `l10n:after_update` | update | after `store:after_update` |
//! | `l10n:before_delete` | delete | before `store:before_delete` |
//! | `l10n:before_query` | query, row | before `store:query` / `store:row_query` |

use lingo_store::{Callbacks, Position, Processor, Session, Statement};
use tracing::{debug, info};

use crate::engine::Localization;

/// Create chain: locale stamping and creation checks.
pub const BEFORE_CREATE: &str = "l10n:before_create";
/// Create chain: post-write reconciliation.
pub const AFTER_CREATE: &str = "l10n:after_create";
/// Update chain: locale condition and stamping.
pub const BEFORE_UPDATE: &str = "l10n:before_update";
/// Update chain: post-write reconciliation.
pub const AFTER_UPDATE: &str = "l10n:after_update";
/// Delete chain: locale condition.
pub const BEFORE_DELETE: &str = "l10n:before_delete";
/// Query and row chains: read scoping.
pub const BEFORE_QUERY: &str = "l10n:before_query";

fn install<F>(processor: &mut Processor, name: &str, position: Position, f: F) -> lingo_store::Result<()>
where
    F: Fn(&Session<'_>, &mut Statement<'_>) -> lingo_store::Result<()> + Send + Sync + 'static,
{
    if processor.contains(name) {
        debug!(name, "callback already registered, skipping");
        return Ok(());
    }
    processor.register_fn(name, position, f)?;
    info!(name, "registered localization callback");
    Ok(())
}

pub(crate) fn register(l10n: &Localization, callbacks: &mut Callbacks) -> lingo_store::Result<()> {
    let e = l10n.clone();
    install(
        &mut callbacks.create,
        BEFORE_CREATE,
        Position::before("store:before_create"),
        move |s, st| e.before_create(s, st),
    )?;
    let e = l10n.clone();
    install(
        &mut callbacks.create,
        AFTER_CREATE,
        Position::before("store:after_create"),
        move |s, st| e.after_write(AFTER_CREATE, s, st),
    )?;

    let e = l10n.clone();
    install(
        &mut callbacks.update,
        BEFORE_UPDATE,
        Position::before("store:before_update"),
        move |s, st| e.before_update(s, st),
    )?;
    let e = l10n.clone();
    install(
        &mut callbacks.update,
        AFTER_UPDATE,
        Position::after("store:after_update"),
        move |s, st| e.after_write(AFTER_UPDATE, s, st),
    )?;

    let e = l10n.clone();
    install(
        &mut callbacks.delete,
        BEFORE_DELETE,
        Position::before("store:before_delete"),
        move |s, st| e.before_delete(s, st),
    )?;

    let e = l10n.clone();
    install(
        &mut callbacks.row,
        BEFORE_QUERY,
        Position::before("store:row_query"),
        move |s, st| e.before_query(s, st),
    )?;
    let e = l10n.clone();
    install(
        &mut callbacks.query,
        BEFORE_QUERY,
        Position::before("store:query"),
        move |s, st| e.before_query(s, st),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_store::{Client, ConnectionConfig, new_in_memory};

    fn client() -> Client {
        Client::new(new_in_memory(&ConnectionConfig::default()).unwrap()).unwrap()
    }

    #[test]
    fn chains_after_registration() {
        let mut client = client();
        Localization::default().register(&mut client).unwrap();
        let callbacks = client.callbacks();
        assert_eq!(
            callbacks.create.names(),
            vec![
                BEFORE_CREATE,
                "store:before_create",
                "store:create",
                AFTER_CREATE,
                "store:after_create"
            ]
        );
        assert_eq!(
            callbacks.update.names(),
            vec![
                BEFORE_UPDATE,
                "store:before_update",
                "store:update",
                "store:after_update",
                AFTER_UPDATE
            ]
        );
        assert_eq!(
            callbacks.delete.names(),
            vec![BEFORE_DELETE, "store:before_delete", "store:delete"]
        );
        assert_eq!(callbacks.query.names(), vec![BEFORE_QUERY, "store:query"]);
        assert_eq!(callbacks.row.names(), vec![BEFORE_QUERY, "store:row_query"]);
    }

    #[test]
    fn registration_is_idempotent() {
        let mut client = client();
        let l10n = Localization::default();
        l10n.register(&mut client).unwrap();
        l10n.register(&mut client).unwrap();
        Localization::default().register(&mut client).unwrap();
        assert_eq!(client.callbacks().create.names().len(), 5);
        assert_eq!(client.callbacks().query.names().len(), 2);
    }
}
