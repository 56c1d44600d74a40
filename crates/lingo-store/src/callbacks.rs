//! Named callback chains.
//!
//! Each [`Operation`] owns a [`Processor`]: an ordered list of named
//! callbacks run against the operation's [`Statement`]. Names are unique per
//! chain; extensions position themselves relative to existing names and can
//! check [`Processor::contains`] to stay idempotent.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::errors::{Result, StoreError};
use crate::executor;
use crate::session::Session;
use crate::statement::{Operation, Statement};

/// A step of an operation chain.
pub trait Callback: Send + Sync {
    /// Inspect or mutate the statement. An error stops the chain.
    fn call(&self, session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()>;
}

impl<F> Callback for F
where
    F: Fn(&Session<'_>, &mut Statement<'_>) -> Result<()> + Send + Sync,
{
    fn call(&self, session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
        self(session, stmt)
    }
}

/// Where a new callback goes in its chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    /// Front of the chain.
    First,
    /// End of the chain.
    Last,
    /// Immediately before the named callback.
    Before(String),
    /// Immediately after the named callback.
    After(String),
}

impl Position {
    /// Shorthand for [`Position::Before`].
    pub fn before(name: impl Into<String>) -> Self {
        Self::Before(name.into())
    }

    /// Shorthand for [`Position::After`].
    pub fn after(name: impl Into<String>) -> Self {
        Self::After(name.into())
    }
}

/// Ordered callbacks of one operation.
#[derive(Default, Clone)]
pub struct Processor {
    entries: Vec<(String, Arc<dyn Callback>)>,
}

impl Processor {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `callback` under `name`.
    ///
    /// A duplicate name is an error. An anchor that is not on the chain
    /// appends the callback at the end.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        position: Position,
        callback: Arc<dyn Callback>,
    ) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(StoreError::Registration(format!(
                "callback '{name}' is already registered"
            )));
        }

        let index = match &position {
            Position::First => 0,
            Position::Last => self.entries.len(),
            Position::Before(anchor) | Position::After(anchor) => {
                match self.index_of(anchor) {
                    Some(i) if matches!(position, Position::After(_)) => i + 1,
                    Some(i) => i,
                    None => {
                        warn!(name = %name, anchor = %anchor, "callback anchor not found, appending");
                        self.entries.len()
                    }
                }
            }
        };

        debug!(name = %name, ?position, index, "registering callback");
        self.entries.insert(index, (name, callback));
        Ok(())
    }

    /// [`Processor::register`] for a plain function or closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, position: Position, f: F) -> Result<()>
    where
        F: Fn(&Session<'_>, &mut Statement<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, position, Arc::new(f))
    }

    /// Callback registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Callback>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cb)| Arc::clone(cb))
    }

    /// Whether `name` is on the chain.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Remove `name`. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() < before
    }

    /// Names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Run every callback in order, stopping at the first error.
    pub fn execute(&self, session: &Session<'_>, stmt: &mut Statement<'_>) -> Result<()> {
        for (name, callback) in &self.entries {
            trace!(callback = %name, entity = %stmt.schema.name, "running callback");
            callback.call(session, stmt)?;
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("callbacks", &self.names())
            .finish()
    }
}

/// One chain per operation.
#[derive(Debug, Default, Clone)]
pub struct Callbacks {
    /// Create chain.
    pub create: Processor,
    /// Update chain.
    pub update: Processor,
    /// Delete chain.
    pub delete: Processor,
    /// Query chain.
    pub query: Processor,
    /// Row-query chain.
    pub row: Processor,
}

impl Callbacks {
    /// Chains holding the default `store:*` callbacks.
    pub fn with_defaults() -> Result<Self> {
        let mut callbacks = Self::default();
        executor::register_defaults(&mut callbacks)?;
        Ok(callbacks)
    }

    /// Chain of `operation`.
    #[must_use]
    pub fn get(&self, operation: Operation) -> &Processor {
        match operation {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
            Operation::Query => &self.query,
            Operation::Row => &self.row,
        }
    }

    /// Mutable chain of `operation`.
    pub fn get_mut(&mut self, operation: Operation) -> &mut Processor {
        match operation {
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
            Operation::Query => &mut self.query,
            Operation::Row => &mut self.row,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
