//! Handler type catalog and the per-driver handler registry.
//!
//! The [`HandlerCatalog`] holds installed handler types keyed by type path;
//! it is the explicit replacement for constant autoloading. Registration
//! resolves a handler name to a catalog entry either through an explicit type
//! path or by naming convention (`host::CamelizedName`, then the global
//! `CamelizedName`).
//!
//! The [`HandlerRegistry`] maps registered handler names to their
//! descriptors. Duplicate registrations are rejected, and lookup
//! distinguishes "nothing was ever configured" ([`DriverError::NoHandler`])
//! from "a name was given but never registered"
//! ([`DriverError::InvalidHandler`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigMap;
use crate::error::DriverError;
use crate::handler::{Handler, HandlerDescriptor, HandlerFactory};
use crate::support;

/// Installed handler types, keyed by type path.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rainman::args::Args;
/// use rainman::handler::{ActionResult, Handler};
/// use rainman::registry::HandlerCatalog;
///
/// struct Enom;
/// impl Handler for Enom {
///     fn invoke(&self, _method: &str, _args: Args) -> Option<ActionResult> {
///         None
///     }
/// }
///
/// let mut catalog = HandlerCatalog::new();
/// catalog.install("domain::Enom", |_config| Arc::new(Enom));
/// assert!(catalog.contains("domain::Enom"));
/// ```
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    types: HashMap<String, HandlerFactory>,
}

impl HandlerCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a handler type under a type path.
    pub fn install<F>(&mut self, type_path: impl Into<String>, factory: F)
    where
        F: Fn(&ConfigMap) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.types.insert(type_path.into(), Arc::new(factory));
    }

    /// Returns `true` when a type path is installed.
    #[must_use]
    pub fn contains(&self, type_path: &str) -> bool {
        self.types.contains_key(type_path)
    }

    /// Resolves a handler name to `(type path, factory)`.
    ///
    /// An explicit path overrides the convention. Otherwise the camelised
    /// name is searched in the host scope first, then globally.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownHandler`] naming the path that was
    /// searched for when no installed type matches.
    pub fn resolve(
        &self,
        host: &str,
        name: &str,
        explicit: Option<&str>,
    ) -> Result<(String, HandlerFactory), DriverError> {
        if let Some(path) = explicit {
            return self
                .types
                .get(path)
                .map(|factory| (path.to_owned(), factory.clone()))
                .ok_or_else(|| DriverError::UnknownHandler {
                    name: name.to_owned(),
                    type_path: path.to_owned(),
                });
        }

        let type_name = support::camelize(name);
        let scoped = support::type_path(host, &type_name);
        for candidate in [scoped.as_str(), type_name.as_str()] {
            if let Some(factory) = self.types.get(candidate) {
                return Ok((candidate.to_owned(), factory.clone()));
            }
        }
        Err(DriverError::UnknownHandler {
            name: name.to_owned(),
            type_path: scoped,
        })
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("installed", &self.types.len())
            .finish_non_exhaustive()
    }
}

/// Registered handlers for one driver, in registration order.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, Arc<HandlerDescriptor>>,
    order: Vec<String>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyRegistered`] when the name is taken; the
    /// existing registration is unaffected.
    pub fn register(&mut self, descriptor: HandlerDescriptor) -> Result<(), DriverError> {
        let name = descriptor.name().to_owned();
        if self.entries.contains_key(&name) {
            return Err(DriverError::AlreadyRegistered { name });
        }
        self.entries.insert(name.clone(), Arc::new(descriptor));
        self.order.push(name);
        Ok(())
    }

    /// Returns `true` when a handler name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the descriptor for a registered name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<HandlerDescriptor>> {
        self.entries.get(name)
    }

    /// Looks up a possibly-unset handler name.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoHandler`] when `name` is `None` and
    /// [`DriverError::InvalidHandler`] when the name was never registered.
    pub fn lookup(&self, name: Option<&str>) -> Result<&Arc<HandlerDescriptor>, DriverError> {
        let name = name.ok_or(DriverError::NoHandler)?;
        self.entries
            .get(name)
            .ok_or_else(|| DriverError::InvalidHandler {
                name: name.to_owned(),
            })
    }

    /// Iterates registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
