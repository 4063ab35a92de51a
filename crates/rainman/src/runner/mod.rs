//! The dispatch runner: validates arguments and delegates one action call to
//! a resolved handler instance.
//!
//! A [`Runner`] is a dispatch handle bound to one handler instance and one
//! action table. Each call is a single synchronous traversal — lookup,
//! filter, validate, delegate — never partially committed. The runner itself
//! performs no side effects beyond validation and delegation.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::action::ActionSet;
use crate::args::{Args, Value};
use crate::error::DriverError;
use crate::handler::Handler;

/// Tracing target for dispatch events.
const RUNNER_TARGET: &str = "rainman::runner";

/// A dispatch handle bound to one handler instance.
///
/// Runners are produced by the driver (`with_handler`, `handler`, namespace
/// access) and stay valid independently of later changes to the driver's
/// current handler: the handler instance is resolved at construction.
pub struct Runner {
    handler_name: String,
    handler: Arc<dyn Handler>,
    actions: Arc<ActionSet>,
}

impl Runner {
    pub(crate) fn new(
        handler_name: impl Into<String>,
        handler: Arc<dyn Handler>,
        actions: Arc<ActionSet>,
    ) -> Self {
        Self {
            handler_name: handler_name.into(),
            handler,
            actions,
        }
    }

    /// Returns the name of the bound handler.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handler_name.as_str()
    }

    /// Returns the bound handler instance.
    #[must_use]
    pub const fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns the action table this runner dispatches against.
    #[must_use]
    pub const fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    /// Executes a declared action: parameter filter, global validation,
    /// action validation, default merging, then delegation to the handler
    /// method. The handler's return value is forwarded verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnregisteredAction`] when the action was never
    /// declared, or when the handler does not implement the delegated method;
    /// validation failures propagate as [`DriverError::MissingParameter`] or
    /// [`DriverError::InvalidArguments`].
    pub fn execute(&self, action: &str, args: Args) -> Result<Value, DriverError> {
        let Some(descriptor) = self.actions.get(action) else {
            return Err(DriverError::UnregisteredAction {
                name: action.to_owned(),
                handler: self.handler_name.clone(),
            });
        };

        let args = descriptor.apply_filter(args);
        let args = self.actions.validations().finalize(descriptor.name(), args)?;

        debug!(
            target: RUNNER_TARGET,
            handler = %self.handler_name,
            action = %descriptor.name(),
            method = %descriptor.delegate_to(),
            "dispatching action"
        );

        match self.handler.invoke(descriptor.delegate_to(), args) {
            Some(outcome) => outcome,
            None => Err(DriverError::UnregisteredAction {
                name: descriptor.delegate_to().to_owned(),
                handler: self.handler_name.clone(),
            }),
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("handler", &self.handler_name)
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}
