//! The declaration façade: turns declarative calls into a wired driver.
//!
//! A [`DriverBuilder`] accumulates installed handler types, registrations,
//! action and namespace declarations, and option specs, then snapshots them
//! into a [`Driver`]. The builder holds no dispatch logic; it only wires the
//! registry, the action tables, and the validations together.
//!
//! `build` is non-consuming: every built driver owns a fresh
//! [`HandlerState`](crate::state::HandlerState) and its own configuration
//! copy, so independent hosts built from one set of declarations never share
//! dispatch state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::action::{ActionDescriptor, ActionSet, ArgsFilter};
use crate::args::Args;
use crate::config::{ConfigMap, ConfigStore};
use crate::driver::{self, Driver, DriverDefinition};
use crate::error::DriverError;
use crate::handler::{Handler, HandlerDescriptor, InitPolicy};
use crate::namespace::NamespaceDef;
use crate::option::OptionRule;
use crate::registry::{HandlerCatalog, HandlerRegistry};

/// Tracing target for declaration-time events.
const BUILDER_TARGET: &str = "rainman::builder";

/// Options for one handler registration.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    class_name: Option<String>,
    init: InitPolicy,
    configure: Option<Arc<dyn Fn(&mut ConfigMap) + Send + Sync>>,
}

impl HandlerOptions {
    /// Creates default options: convention-resolved type, memoized instance,
    /// no configuration block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides convention-based type resolution with an explicit type path.
    #[must_use]
    pub fn with_class_name(mut self, type_path: impl Into<String>) -> Self {
        self.class_name = Some(type_path.into());
        self
    }

    /// Sets the instantiation policy.
    #[must_use]
    pub fn with_init(mut self, policy: InitPolicy) -> Self {
        self.init = policy;
        self
    }

    /// Attaches a block invoked with the handler's fresh config bag at
    /// registration time.
    #[must_use]
    pub fn with_config<F>(mut self, configure: F) -> Self
    where
        F: Fn(&mut ConfigMap) + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(configure));
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("class_name", &self.class_name)
            .field("init", &self.init)
            .field("configured", &self.configure.is_some())
            .finish()
    }
}

/// Options for one action declaration.
#[derive(Clone, Default)]
pub struct ActionOptions {
    delegate_to: Option<String>,
    aliases: Vec<String>,
    filter: Option<ArgsFilter>,
    options: Vec<(String, OptionRule)>,
}

impl ActionOptions {
    /// Creates default options: delegate to the action's own name, no
    /// aliases, no filter, no option declarations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegates the action to a differently-named handler method.
    #[must_use]
    pub fn with_delegate_to(mut self, method: impl Into<String>) -> Self {
        self.delegate_to = Some(method.into());
        self
    }

    /// Adds an alias under which the action is also callable.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Attaches a pure filter normalising arguments before validation.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Args) -> Args + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Declares an option for this action.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, rule: OptionRule) -> Self {
        self.options.push((key.into(), rule));
        self
    }

    /// Declares a bare option key: present but not required.
    #[must_use]
    pub fn with_flag(self, key: impl Into<String>) -> Self {
        self.with_option(key, OptionRule::optional())
    }
}

impl fmt::Debug for ActionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionOptions")
            .field("delegate_to", &self.delegate_to)
            .field("aliases", &self.aliases)
            .field("filtered", &self.filter.is_some())
            .field("options", &self.options.len())
            .finish()
    }
}

/// Options for one namespace declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceOptions {
    inherit: bool,
}

impl NamespaceOptions {
    /// Creates default options: the namespace starts with no global option
    /// declarations of its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inherits the driver's global option declarations into the namespace's
    /// global scope. Namespace-local declarations shadow inherited ones.
    #[must_use]
    pub const fn inherit() -> Self {
        Self { inherit: true }
    }
}

/// Declares the actions of one namespace.
#[derive(Debug)]
pub struct NamespaceBuilder {
    name: String,
    actions: ActionSet,
}

impl NamespaceBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: ActionSet::new(),
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Declares a namespace action.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name collision within
    /// the namespace.
    pub fn define_action(&mut self, name: &str) -> Result<&mut Self, DriverError> {
        self.define_action_with(name, ActionOptions::default())
    }

    /// Declares a namespace action with options.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name or alias
    /// collision within the namespace.
    pub fn define_action_with(
        &mut self,
        name: &str,
        options: ActionOptions,
    ) -> Result<&mut Self, DriverError> {
        define_action_on(&mut self.actions, name, options)?;
        Ok(self)
    }

    /// Declares an option applied to every action in this namespace.
    pub fn add_option_all(&mut self, key: impl Into<String>, rule: OptionRule) -> &mut Self {
        self.actions.validations_mut().global_mut().add(key, rule);
        self
    }
}

struct NamespaceStage {
    name: String,
    actions: ActionSet,
    inherit: bool,
}

/// Builds a [`Driver`] from handler, action, and namespace declarations.
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
///         match method {
///             "list" => Some(Ok(json!("enom_list"))),
///             _ => None,
///         }
///     }
/// }
///
/// let mut builder = Driver::builder("domain");
/// builder.install("domain::Enom", |_config| Arc::new(Enom));
/// builder.register_handler("enom")?;
/// builder.define_action("list")?;
/// builder.set_default_handler("enom")?;
///
/// let domain = builder.build();
/// assert_eq!(domain.call("list", Args::Empty)?, json!("enom_list"));
/// # Ok::<(), rainman::DriverError>(())
/// ```
pub struct DriverBuilder {
    name: String,
    catalog: HandlerCatalog,
    registry: HandlerRegistry,
    actions: ActionSet,
    namespaces: Vec<NamespaceStage>,
    config: ConfigStore,
    default_handler: Option<String>,
    strict_scoped: bool,
}

impl DriverBuilder {
    /// Creates a builder for a named driver.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: HandlerCatalog::new(),
            registry: HandlerRegistry::new(),
            actions: ActionSet::new(),
            namespaces: Vec::new(),
            config: ConfigStore::new(),
            default_handler: None,
            strict_scoped: false,
        }
    }

    /// Returns the driver name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Installs a handler type into the catalog under a type path, making it
    /// available to `register_handler`.
    pub fn install<F>(&mut self, type_path: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ConfigMap) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.catalog.install(type_path, factory);
        self
    }

    /// Registers a handler by name, resolving its type by convention.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownHandler`] when no installed type matches
    /// and [`DriverError::AlreadyRegistered`] for a duplicate name.
    pub fn register_handler(&mut self, name: &str) -> Result<&mut Self, DriverError> {
        self.register_handler_with(name, HandlerOptions::default())
    }

    /// Registers a handler by name with explicit options.
    ///
    /// The handler gets a fresh config bag, scoped under its name; an
    /// attached config block runs against that bag here.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownHandler`] when the type cannot be
    /// resolved and [`DriverError::AlreadyRegistered`] for a duplicate name.
    pub fn register_handler_with(
        &mut self,
        name: &str,
        options: HandlerOptions,
    ) -> Result<&mut Self, DriverError> {
        let (type_path, factory) =
            self.catalog
                .resolve(&self.name, name, options.class_name.as_deref())?;
        let descriptor = HandlerDescriptor::new(name, type_path.clone(), options.init, factory);
        self.registry.register(descriptor)?;

        let bag = self.config.scope_mut(name);
        if let Some(configure) = &options.configure {
            configure(bag);
        }

        debug!(
            target: BUILDER_TARGET,
            driver = %self.name,
            handler = %name,
            type_path = %type_path,
            "registered handler"
        );
        Ok(self)
    }

    /// Sets the handler used when no override is active.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidHandler`] when the name was never
    /// registered.
    pub fn set_default_handler(&mut self, name: &str) -> Result<&mut Self, DriverError> {
        self.registry.lookup(Some(name))?;
        self.default_handler = Some(name.to_owned());
        Ok(self)
    }

    /// Returns the driver-global config bag for mutation.
    pub fn global_config(&mut self) -> &mut ConfigMap {
        self.config.global_mut()
    }

    /// Declares an option applied to every top-level action.
    pub fn add_option_all(&mut self, key: impl Into<String>, rule: OptionRule) -> &mut Self {
        self.actions.validations_mut().global_mut().add(key, rule);
        self
    }

    /// Declares an action delegating to the handler method of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name collision with
    /// an existing action, alias, or namespace.
    pub fn define_action(&mut self, name: &str) -> Result<&mut Self, DriverError> {
        self.define_action_with(name, ActionOptions::default())
    }

    /// Declares an action with options.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name or alias
    /// collision with an existing action, alias, or namespace.
    pub fn define_action_with(
        &mut self,
        name: &str,
        options: ActionOptions,
    ) -> Result<&mut Self, DriverError> {
        for candidate in std::iter::once(name).chain(options.aliases.iter().map(String::as_str)) {
            if self.namespace_taken(candidate) {
                return Err(DriverError::AlreadyImplemented {
                    name: candidate.to_owned(),
                });
            }
        }
        define_action_on(&mut self.actions, name, options)?;
        Ok(self)
    }

    /// Declares a namespace and its actions through a builder block.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name collision, or
    /// any error the block produced.
    pub fn define_namespace<F>(&mut self, name: &str, configure: F) -> Result<&mut Self, DriverError>
    where
        F: FnOnce(&mut NamespaceBuilder) -> Result<(), DriverError>,
    {
        self.define_namespace_with(name, NamespaceOptions::default(), configure)
    }

    /// Declares a namespace with options (e.g. global-option inheritance).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyImplemented`] on a name collision, or
    /// any error the block produced.
    pub fn define_namespace_with<F>(
        &mut self,
        name: &str,
        options: NamespaceOptions,
        configure: F,
    ) -> Result<&mut Self, DriverError>
    where
        F: FnOnce(&mut NamespaceBuilder) -> Result<(), DriverError>,
    {
        if self.actions.contains(name) || self.namespace_taken(name) {
            return Err(DriverError::AlreadyImplemented {
                name: name.to_owned(),
            });
        }

        let mut namespace = NamespaceBuilder::new(name);
        configure(&mut namespace)?;
        self.namespaces.push(NamespaceStage {
            name: namespace.name,
            actions: namespace.actions,
            inherit: options.inherit,
        });
        Ok(self)
    }

    /// Requires the scoped-dispatch form: when set, requesting a bare
    /// dispatch handle through [`Driver::handler`] fails with
    /// [`DriverError::MissingBlock`].
    pub fn require_scoped_callback(&mut self, required: bool) -> &mut Self {
        self.strict_scoped = required;
        self
    }

    /// Snapshots the declarations into a driver with fresh dispatch state.
    ///
    /// Building is non-consuming; each call produces an isolated driver. The
    /// definition is recorded in the process-wide list (see
    /// [`driver::all`]).
    #[must_use]
    pub fn build(&self) -> Driver {
        let mut namespaces = HashMap::new();
        let mut namespace_order = Vec::new();
        for stage in &self.namespaces {
            let mut actions = stage.actions.clone();
            if stage.inherit {
                if let Some(global) = self.actions.validations().global() {
                    actions.validations_mut().global_mut().merge_missing(global);
                }
            }
            namespaces.insert(
                stage.name.clone(),
                NamespaceDef::new(&stage.name, Arc::new(actions), stage.inherit),
            );
            namespace_order.push(stage.name.clone());
        }

        let definition = Arc::new(DriverDefinition::new(
            self.name.clone(),
            self.registry.clone(),
            Arc::new(self.actions.clone()),
            namespaces,
            namespace_order,
            self.default_handler.clone(),
            self.strict_scoped,
        ));
        driver::record(&definition);
        Driver::from_definition(definition, self.config.clone())
    }

    fn namespace_taken(&self, name: &str) -> bool {
        self.namespaces.iter().any(|stage| stage.name == name)
    }
}

impl fmt::Debug for DriverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverBuilder")
            .field("name", &self.name)
            .field("handlers", &self.registry.len())
            .field("actions", &self.actions.len())
            .field("namespaces", &self.namespaces.len())
            .field("default_handler", &self.default_handler)
            .finish_non_exhaustive()
    }
}

fn define_action_on(
    actions: &mut ActionSet,
    name: &str,
    options: ActionOptions,
) -> Result<(), DriverError> {
    let ActionOptions {
        delegate_to,
        aliases,
        filter,
        options: declared,
    } = options;

    let delegate_to = delegate_to.unwrap_or_else(|| name.to_owned());
    actions.define(ActionDescriptor::new(name, delegate_to, filter), &aliases)?;

    if !declared.is_empty() {
        let spec = actions.validations_mut().for_action_mut(name);
        for (key, rule) in declared {
            spec.add(key, rule);
        }
    }
    Ok(())
}
