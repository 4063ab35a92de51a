//! A handler abstraction layer: one stable action surface, many
//! interchangeable backends.
//!
//! The `rainman` crate implements driver-based dispatch for services that
//! front several providers of the same capability — domain registrars,
//! payment gateways, delivery carriers. A host declares the actions its
//! service supports, registers one handler per provider, and dispatches every
//! call through a [`Driver`]; which provider actually runs is a runtime
//! decision, never part of the call site.
//!
//! Dispatch resolves against the driver's *current* handler: a configured
//! default, a sticky override installed with
//! [`Driver::set_current_handler`], or a scoped override that
//! [`Driver::with_handler`] installs for the duration of a callback and
//! restores afterwards, on error and unwind included. Nested action groups
//! are declared as namespaces and dispatch against the nested handler of
//! whichever outer handler is current.
//!
//! Declared actions carry option specs: required keys, bare keys, and
//! defaults are validated and merged before the handler method ever runs.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rainman::{Args, Driver, Handler};
//! use rainman::handler::ActionResult;
//! use serde_json::json;
//!
//! struct Opensrs;
//! impl Handler for Opensrs {
//!     fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
//!         (method == "list").then(|| Ok(json!(["example.com"])))
//!     }
//! }
//!
//! let mut builder = Driver::builder("domain");
//! builder.install("domain::Opensrs", |_config| Arc::new(Opensrs));
//! builder.register_handler("opensrs")?;
//! builder.define_action("list")?;
//! builder.set_default_handler("opensrs")?;
//!
//! let domain = builder.build();
//! assert_eq!(domain.call("list", Args::Empty)?, json!(["example.com"]));
//! # Ok::<(), rainman::DriverError>(())
//! ```

pub mod action;
pub mod args;
pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod namespace;
pub mod option;
pub mod registry;
pub mod runner;
pub mod state;
mod support;

#[cfg(test)]
mod tests;

pub use self::args::{Args, KeyedArgs, Value};
pub use self::builder::{
    ActionOptions, DriverBuilder, HandlerOptions, NamespaceBuilder, NamespaceOptions,
};
pub use self::config::{ConfigMap, ConfigStore};
pub use self::driver::{Driver, DriverDefinition};
pub use self::error::DriverError;
pub use self::handler::{ActionResult, Handler, HandlerFactory, InitPolicy};
pub use self::namespace::NamespaceContext;
pub use self::option::{OptionRule, OptionSet};
pub use self::registry::{HandlerCatalog, HandlerRegistry};
pub use self::runner::Runner;
