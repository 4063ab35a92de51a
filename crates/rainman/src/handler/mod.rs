//! The handler seam: the trait concrete adapters implement, plus the
//! registration metadata the registry stores about each one.
//!
//! A handler is a concrete implementation of a driver's declared actions,
//! typically one per third-party API. Handlers expose a single [`Handler::invoke`]
//! entry point keyed by method name; returning `None` means the handler does
//! not implement that method, which the runner surfaces as
//! [`DriverError::UnregisteredAction`]. Nested namespace handlers are
//! obtained through the [`Handler::namespace`] hook.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::args::{Args, Value};
use crate::config::ConfigMap;
use crate::error::DriverError;

/// Outcome of a handler method: the returned value, or a dispatch error the
/// handler chose to surface.
pub type ActionResult = Result<Value, DriverError>;

/// A concrete implementation of a driver's actions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rainman::args::Args;
/// use rainman::handler::{ActionResult, Handler};
/// use serde_json::json;
///
/// struct Opensrs;
///
/// impl Handler for Opensrs {
///     fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
///         match method {
///             "list" => Some(Ok(json!("opensrs_list"))),
///             _ => None,
///         }
///     }
/// }
///
/// let handler: Arc<dyn Handler> = Arc::new(Opensrs);
/// assert!(handler.invoke("list", Args::Empty).is_some());
/// assert!(handler.invoke("transfer", Args::Empty).is_none());
/// ```
pub trait Handler: Send + Sync {
    /// Invokes a method by name. `None` means the handler has no such
    /// method.
    fn invoke(&self, method: &str, args: Args) -> Option<ActionResult>;

    /// Returns the nested handler backing a namespace, if this handler
    /// provides one.
    fn namespace(&self, name: &str) -> Option<Arc<dyn Handler>> {
        let _ = name;
        None
    }
}

/// Constructor producing a handler instance from its merged configuration.
pub type HandlerFactory = Arc<dyn Fn(&ConfigMap) -> Arc<dyn Handler> + Send + Sync>;

/// Instantiation policy for a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// One instance per driver, constructed lazily on first dispatch and
    /// reused until explicitly invalidated.
    #[default]
    Memoized,
    /// A fresh instance for every dispatch.
    PerCall,
    /// One shared instance across every driver built from the same
    /// definitions; suited to stateless handlers.
    Singleton,
}

/// Registered handler metadata: the name, the resolved type path, the
/// factory, and the instantiation policy.
pub struct HandlerDescriptor {
    name: String,
    type_path: String,
    init: InitPolicy,
    factory: HandlerFactory,
    singleton: OnceCell<Arc<dyn Handler>>,
}

impl HandlerDescriptor {
    pub(crate) fn new(
        name: impl Into<String>,
        type_path: impl Into<String>,
        init: InitPolicy,
        factory: HandlerFactory,
    ) -> Self {
        Self {
            name: name.into(),
            type_path: type_path.into(),
            init,
            factory,
            singleton: OnceCell::new(),
        }
    }

    /// Returns the handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the resolved handler type path.
    #[must_use]
    pub fn type_path(&self) -> &str {
        self.type_path.as_str()
    }

    /// Returns the instantiation policy.
    #[must_use]
    pub const fn init_policy(&self) -> InitPolicy {
        self.init
    }

    /// Produces an instance according to the policy. Memoization per driver
    /// is the caller's concern; singletons are initialised here exactly once,
    /// concurrent first access resolving to a single winning instance.
    pub(crate) fn instantiate(&self, config: &ConfigMap) -> Arc<dyn Handler> {
        match self.init {
            InitPolicy::Singleton => self
                .singleton
                .get_or_init(|| (self.factory)(config))
                .clone(),
            InitPolicy::Memoized | InitPolicy::PerCall => (self.factory)(config),
        }
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("init", &self.init)
            .finish_non_exhaustive()
    }
}
