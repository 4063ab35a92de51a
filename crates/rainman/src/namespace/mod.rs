//! Nested dispatch scopes.
//!
//! A namespace groups actions dispatched against a nested handler obtained
//! from the outer handler that is current when the namespace is first
//! touched. Contexts are constructed lazily and cached per
//! `(namespace, outer handler)` pair — switching the outer handler yields a
//! distinct context rather than rebinding the existing one.

use std::fmt;
use std::sync::Arc;

use crate::action::ActionSet;
use crate::args::{Args, Value};
use crate::error::DriverError;
use crate::runner::Runner;

/// The build-time definition of a namespace: its name, its own action table,
/// and whether it inherits the driver's global option declarations.
#[derive(Debug, Clone)]
pub struct NamespaceDef {
    name: String,
    actions: Arc<ActionSet>,
    inherit: bool,
}

impl NamespaceDef {
    pub(crate) fn new(name: impl Into<String>, actions: Arc<ActionSet>, inherit: bool) -> Self {
        Self {
            name: name.into(),
            actions,
            inherit,
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the namespace's action table.
    #[must_use]
    pub const fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    /// Returns `true` when the namespace inherited the driver's global
    /// option declarations.
    #[must_use]
    pub const fn inherits(&self) -> bool {
        self.inherit
    }
}

/// A live nested dispatch scope, rooted at the nested handler of the outer
/// handler that was current when it was created.
pub struct NamespaceContext {
    namespace: String,
    parent_handler: String,
    runner: Runner,
}

impl NamespaceContext {
    pub(crate) fn new(
        namespace: impl Into<String>,
        parent_handler: impl Into<String>,
        runner: Runner,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            parent_handler: parent_handler.into(),
            runner,
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.namespace.as_str()
    }

    /// Returns the outer handler this context is rooted at.
    #[must_use]
    pub fn parent_handler(&self) -> &str {
        self.parent_handler.as_str()
    }

    /// Dispatches a namespace action, with exactly the top-level semantics.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnregisteredAction`] for actions not declared
    /// inside the namespace block; validation failures propagate unchanged.
    pub fn call(&self, action: &str, args: Args) -> Result<Value, DriverError> {
        self.runner.execute(action, args)
    }

    /// Returns the underlying dispatch runner.
    #[must_use]
    pub const fn runner(&self) -> &Runner {
        &self.runner
    }
}

impl fmt::Debug for NamespaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceContext")
            .field("namespace", &self.namespace)
            .field("parent_handler", &self.parent_handler)
            .finish_non_exhaustive()
    }
}
