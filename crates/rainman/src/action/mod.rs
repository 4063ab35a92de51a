//! Declared actions and the action table used at dispatch time.
//!
//! Each declared action becomes an [`ActionDescriptor`]: the name callers
//! use, the handler method it delegates to (aliasable), and an optional pure
//! parameter filter applied before validation. An [`ActionSet`] is the
//! explicit dispatch table replacing "respond to and forward" reflection: an
//! action not present in the table is an error, never a runtime surprise.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::error::DriverError;
use crate::option::Validations;

/// Pure function normalising call arguments before validation and dispatch.
pub type ArgsFilter = Arc<dyn Fn(Args) -> Args + Send + Sync>;

/// A declared action.
pub struct ActionDescriptor {
    name: String,
    delegate_to: String,
    filter: Option<ArgsFilter>,
}

impl ActionDescriptor {
    pub(crate) fn new(
        name: impl Into<String>,
        delegate_to: impl Into<String>,
        filter: Option<ArgsFilter>,
    ) -> Self {
        Self {
            name: name.into(),
            delegate_to: delegate_to.into(),
            filter,
        }
    }

    /// Returns the declared action name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the handler method this action delegates to. Defaults to the
    /// action name.
    #[must_use]
    pub fn delegate_to(&self) -> &str {
        self.delegate_to.as_str()
    }

    /// Applies the parameter filter, if one was declared.
    #[must_use]
    pub(crate) fn apply_filter(&self, args: Args) -> Args {
        match &self.filter {
            Some(filter) => filter(args),
            None => args,
        }
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("delegate_to", &self.delegate_to)
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// The dispatch table for one scope (a driver, or one namespace): declared
/// actions plus their validation specs. Aliases share the descriptor of the
/// action they alias.
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    entries: HashMap<String, Arc<ActionDescriptor>>,
    order: Vec<String>,
    validations: Validations,
}

impl ActionSet {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declared action and any aliases.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] when the name or an alias
    /// collides with an existing entry; nothing is added in that case.
    pub(crate) fn define(
        &mut self,
        descriptor: ActionDescriptor,
        aliases: &[String],
    ) -> Result<(), DriverError> {
        let name = descriptor.name().to_owned();
        if self.entries.contains_key(&name) {
            return Err(DriverError::AlreadyImplemented { name });
        }
        for alias in aliases {
            if *alias == name || self.entries.contains_key(alias) {
                return Err(DriverError::AlreadyImplemented {
                    name: alias.clone(),
                });
            }
        }

        let descriptor = Arc::new(descriptor);
        for alias in aliases {
            self.entries.insert(alias.clone(), descriptor.clone());
        }
        self.entries.insert(name.clone(), descriptor);
        self.order.push(name);
        Ok(())
    }

    /// Looks up an action by declared name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ActionDescriptor>> {
        self.entries.get(name)
    }

    /// Returns `true` when a name or alias is taken.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates declared action names (not aliases) in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns the validation specs for this table.
    #[must_use]
    pub const fn validations(&self) -> &Validations {
        &self.validations
    }

    pub(crate) const fn validations_mut(&mut self) -> &mut Validations {
        &mut self.validations
    }

    /// Returns the number of declared actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when no actions are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
