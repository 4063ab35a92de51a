//! The driver: the host-facing dispatch surface.
//!
//! A [`Driver`] owns one [`HandlerState`] and routes each declared action to
//! whichever registered handler is current — the default, a sticky override,
//! or a scoped override installed by [`Driver::with_handler`]. Namespaced
//! actions dispatch through lazily-built [`NamespaceContext`]s partitioned by
//! the outer handler active at first touch.
//!
//! Drivers are confined to one logical execution context: dispatch state sits
//! behind a `RefCell`, never a lock, so the save/override/restore triple of a
//! scoped call cannot race. The immutable definition behind a driver is
//! `Send + Sync` and may be shared freely.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::action::ActionSet;
use crate::args::{Args, Value};
use crate::builder::DriverBuilder;
use crate::config::{ConfigMap, ConfigStore};
use crate::error::DriverError;
use crate::handler::{Handler, InitPolicy};
use crate::namespace::{NamespaceContext, NamespaceDef};
use crate::registry::HandlerRegistry;
use crate::runner::Runner;
use crate::state::{HandlerState, OverrideGuard};
use crate::support;

/// Tracing target for driver lifecycle events.
const DRIVER_TARGET: &str = "rainman::driver";

/// The immutable, shareable part of a driver: registered handlers, declared
/// actions and namespaces, and build-time settings.
pub struct DriverDefinition {
    name: String,
    registry: HandlerRegistry,
    actions: Arc<ActionSet>,
    namespaces: HashMap<String, NamespaceDef>,
    namespace_order: Vec<String>,
    default_handler: Option<String>,
    strict_scoped: bool,
}

impl DriverDefinition {
    pub(crate) fn new(
        name: String,
        registry: HandlerRegistry,
        actions: Arc<ActionSet>,
        namespaces: HashMap<String, NamespaceDef>,
        namespace_order: Vec<String>,
        default_handler: Option<String>,
        strict_scoped: bool,
    ) -> Self {
        Self {
            name,
            registry,
            actions,
            namespaces,
            namespace_order,
            default_handler,
            strict_scoped,
        }
    }

    /// Returns the driver name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the handler registry.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Returns the top-level action table.
    #[must_use]
    pub const fn actions(&self) -> &Arc<ActionSet> {
        &self.actions
    }

    /// Returns a namespace definition by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceDef> {
        self.namespaces.get(name)
    }

    /// Iterates namespace names in declaration order.
    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespace_order.iter().map(String::as_str)
    }

    /// Returns the build-time default handler, if one was set.
    #[must_use]
    pub fn default_handler(&self) -> Option<&str> {
        self.default_handler.as_deref()
    }

    /// Returns `true` when bare dispatch handles are disallowed.
    #[must_use]
    pub const fn requires_scoped_callback(&self) -> bool {
        self.strict_scoped
    }
}

impl fmt::Debug for DriverDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverDefinition")
            .field("name", &self.name)
            .field("handlers", &self.registry.len())
            .field("actions", &self.actions.len())
            .field("namespaces", &self.namespace_order)
            .finish_non_exhaustive()
    }
}

/// A host-facing dispatcher over a set of interchangeable handlers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rainman::args::Args;
/// use rainman::handler::{ActionResult, Handler};
/// use rainman::Driver;
/// use serde_json::json;
///
/// struct Enom;
/// impl Handler for Enom {
///     fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
///         (method == "list").then(|| Ok(json!("enom_list")))
///     }
/// }
///
/// struct Opensrs;
/// impl Handler for Opensrs {
///     fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
///         (method == "list").then(|| Ok(json!("opensrs_list")))
///     }
/// }
///
/// let mut builder = Driver::builder("domain");
/// builder.install("domain::Enom", |_config| Arc::new(Enom));
/// builder.install("domain::Opensrs", |_config| Arc::new(Opensrs));
/// builder.register_handler("enom")?;
/// builder.register_handler("opensrs")?;
/// builder.define_action("list")?;
/// builder.set_default_handler("opensrs")?;
/// let domain = builder.build();
///
/// assert_eq!(domain.call("list", Args::Empty)?, json!("opensrs_list"));
/// let scoped = domain.with_handler("enom", |h| h.execute("list", Args::Empty))?;
/// assert_eq!(scoped, json!("enom_list"));
/// assert_eq!(domain.call("list", Args::Empty)?, json!("opensrs_list"));
/// # Ok::<(), rainman::DriverError>(())
/// ```
pub struct Driver {
    definition: Arc<DriverDefinition>,
    config: ConfigStore,
    state: RefCell<HandlerState>,
    namespace_cache: RefCell<HashMap<(String, String), Arc<NamespaceContext>>>,
}

impl Driver {
    /// Starts declaring a new driver.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DriverBuilder {
        DriverBuilder::new(name)
    }

    pub(crate) fn from_definition(definition: Arc<DriverDefinition>, config: ConfigStore) -> Self {
        let mut state = HandlerState::new();
        if let Some(default) = definition.default_handler() {
            state.set_default(default);
        }
        Self {
            definition,
            config,
            state: RefCell::new(state),
            namespace_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the driver name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the shared definition backing this driver.
    #[must_use]
    pub const fn definition(&self) -> &Arc<DriverDefinition> {
        &self.definition
    }

    // -----------------------------------------------------------------------
    // Call surface
    // -----------------------------------------------------------------------

    /// Dispatches a declared action to the current handler.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoHandler`] when neither a default nor an
    /// override is set; otherwise propagates runner errors (validation,
    /// unregistered action).
    pub fn call(&self, action: &str, args: Args) -> Result<Value, DriverError> {
        self.runner()?.execute(action, args)
    }

    /// Runs a callback with dispatch scoped to a named handler.
    ///
    /// The override is installed for the duration of the callback and the
    /// prior state is restored afterwards — on error and unwind as well as on
    /// normal return. Calls nest; each scope restores exactly the value it
    /// displaced.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidHandler`] for an unregistered name, or
    /// whatever the callback returns.
    pub fn with_handler<T, F>(&self, name: &str, callback: F) -> Result<T, DriverError>
    where
        F: FnOnce(&Runner) -> Result<T, DriverError>,
    {
        self.definition.registry().lookup(Some(name))?;
        let _guard = OverrideGuard::activate(&self.state, name);
        let runner = self.runner()?;
        callback(&runner)
    }

    /// Runs a callback against the current handler without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoHandler`] when no handler is current, or
    /// whatever the callback returns.
    pub fn with_current<T, F>(&self, callback: F) -> Result<T, DriverError>
    where
        F: FnOnce(&Runner) -> Result<T, DriverError>,
    {
        let runner = self.runner()?;
        callback(&runner)
    }

    /// Returns a dispatch handle bound to a named handler, without touching
    /// current-handler state. Useful for chained calls against one handler.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingBlock`] when the driver was built with
    /// `require_scoped_callback`, and [`DriverError::InvalidHandler`] for an
    /// unregistered name.
    pub fn handler(&self, name: &str) -> Result<Runner, DriverError> {
        if self.definition.requires_scoped_callback() {
            return Err(DriverError::MissingBlock {
                operation: "with_handler".to_owned(),
            });
        }
        self.runner_for(name)
    }

    /// Returns a dispatch handle bound to the current handler.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoHandler`] when neither a default nor an
    /// override is set.
    pub fn runner(&self) -> Result<Runner, DriverError> {
        let current = self.current_handler().ok_or(DriverError::NoHandler)?;
        self.runner_for(&current)
    }

    // -----------------------------------------------------------------------
    // Handler selection
    // -----------------------------------------------------------------------

    /// Sets the default handler.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidHandler`] for an unregistered name.
    pub fn set_default_handler(&self, name: &str) -> Result<(), DriverError> {
        self.definition.registry().lookup(Some(name))?;
        self.state.borrow_mut().set_default(name);
        Ok(())
    }

    /// Returns the default handler name, if set.
    #[must_use]
    pub fn default_handler(&self) -> Option<String> {
        self.state.borrow().default_handler().map(str::to_owned)
    }

    /// Installs a sticky override, active until cleared or displaced.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidHandler`] for an unregistered name.
    pub fn set_current_handler(&self, name: &str) -> Result<(), DriverError> {
        self.definition.registry().lookup(Some(name))?;
        self.state.borrow_mut().set_override(Some(name.to_owned()));
        Ok(())
    }

    /// Clears the sticky override; dispatch falls back to the default.
    pub fn clear_current_handler(&self) {
        self.state.borrow_mut().set_override(None);
    }

    /// Returns the current handler name: the override if set, else the
    /// default.
    #[must_use]
    pub fn current_handler(&self) -> Option<String> {
        self.state.borrow().current().map(str::to_owned)
    }

    // -----------------------------------------------------------------------
    // Namespaces
    // -----------------------------------------------------------------------

    /// Resolves a namespace against the current handler.
    ///
    /// The context is constructed lazily, once per `(namespace, current
    /// handler)` pair, and cached; switching the outer handler yields a
    /// distinct context rooted at that handler's nested type.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnregisteredAction`] for an undeclared
    /// namespace, [`DriverError::NoHandler`] when no handler is current, and
    /// [`DriverError::UnknownHandler`] when the outer handler provides no
    /// nested handler for this namespace.
    pub fn namespace(&self, name: &str) -> Result<Arc<NamespaceContext>, DriverError> {
        let Some(def) = self.definition.namespace(name) else {
            return Err(DriverError::UnregisteredAction {
                name: name.to_owned(),
                handler: self.definition.name().to_owned(),
            });
        };
        let current = self.current_handler().ok_or(DriverError::NoHandler)?;

        let key = (name.to_owned(), current.clone());
        if let Some(context) = self.namespace_cache.borrow().get(&key) {
            return Ok(context.clone());
        }

        let descriptor = self.definition.registry().lookup(Some(&current))?.clone();
        let outer = self.instance(&current)?;
        let nested = outer.namespace(name).ok_or_else(|| DriverError::UnknownHandler {
            name: name.to_owned(),
            type_path: support::type_path(descriptor.type_path(), &support::camelize(name)),
        })?;

        debug!(
            target: DRIVER_TARGET,
            driver = %self.definition.name(),
            namespace = %name,
            handler = %current,
            "constructed namespace context"
        );
        let context = Arc::new(NamespaceContext::new(
            name,
            current.clone(),
            Runner::new(current, nested, def.actions().clone()),
        ));
        self.namespace_cache.borrow_mut().insert(key, context.clone());
        Ok(context)
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Drops the memoized instance for one handler; the next dispatch
    /// constructs a fresh one.
    pub fn invalidate_instance(&self, name: &str) {
        self.state.borrow_mut().invalidate(name);
    }

    /// Drops every memoized handler instance.
    pub fn clear_instances(&self) {
        self.state.borrow_mut().clear_instances();
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Returns registered handlers as `(name, type path)` pairs in
    /// registration order.
    #[must_use]
    pub fn handlers(&self) -> Vec<(String, String)> {
        let registry = self.definition.registry();
        registry
            .names()
            .filter_map(|name| {
                registry
                    .get(name)
                    .map(|descriptor| (name.to_owned(), descriptor.type_path().to_owned()))
            })
            .collect()
    }

    /// Returns declared top-level action names in declaration order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.definition.actions().names().map(str::to_owned).collect()
    }

    /// Returns declared namespace names in declaration order.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        self.definition.namespace_names().map(str::to_owned).collect()
    }

    /// Returns the configuration store.
    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Returns a handler's merged config bag: global keys overlaid by the
    /// handler's own.
    #[must_use]
    pub fn handler_config(&self, name: &str) -> ConfigMap {
        self.config.merged(name)
    }

    fn runner_for(&self, name: &str) -> Result<Runner, DriverError> {
        let instance = self.instance(name)?;
        Ok(Runner::new(
            name,
            instance,
            self.definition.actions().clone(),
        ))
    }

    fn instance(&self, name: &str) -> Result<Arc<dyn Handler>, DriverError> {
        let descriptor = self.definition.registry().lookup(Some(name))?.clone();
        match descriptor.init_policy() {
            InitPolicy::PerCall | InitPolicy::Singleton => {
                Ok(descriptor.instantiate(&self.config.merged(name)))
            }
            InitPolicy::Memoized => {
                if let Some(existing) = self.state.borrow().cached_instance(name) {
                    return Ok(existing);
                }
                let created = descriptor.instantiate(&self.config.merged(name));
                self.state
                    .borrow_mut()
                    .cache_instance(name, created.clone());
                Ok(created)
            }
        }
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.definition.name())
            .field("current", &self.current_handler())
            .field("default", &self.default_handler())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Process-wide definition list
// ---------------------------------------------------------------------------

static DEFINITIONS: Lazy<Mutex<Vec<Arc<DriverDefinition>>>> = Lazy::new(|| Mutex::new(Vec::new()));

fn definitions() -> std::sync::MutexGuard<'static, Vec<Arc<DriverDefinition>>> {
    DEFINITIONS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Records a built definition, keyed by driver name; rebuilding a driver
/// replaces its entry.
pub(crate) fn record(definition: &Arc<DriverDefinition>) {
    let mut list = definitions();
    if let Some(existing) = list
        .iter_mut()
        .find(|entry| entry.name() == definition.name())
    {
        *existing = definition.clone();
    } else {
        list.push(definition.clone());
    }
}

/// Returns every known driver definition, in first-build order.
///
/// The list exists for introspection and test teardown only; dispatch never
/// consults it.
#[must_use]
pub fn all() -> Vec<Arc<DriverDefinition>> {
    definitions().clone()
}

/// Clears the process-wide definition list.
pub fn reset() {
    definitions().clear();
}
