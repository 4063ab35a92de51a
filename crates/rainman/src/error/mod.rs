//! Domain errors raised by driver configuration and dispatch.
//!
//! All errors use a `thiserror`-derived enum with structured context so
//! callers can inspect the failure programmatically. Every variant reflects a
//! programming or configuration mistake in the host; the library performs no
//! I/O and has no transient-failure class. Where the mistake has an obvious
//! fix, the message names the remedial call.

use thiserror::Error;

/// Errors arising from driver setup and dispatch.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A handler name was registered twice. The first registration is left
    /// intact.
    #[error("handler '{name}' is already registered")]
    AlreadyRegistered {
        /// Name of the duplicate registration.
        name: String,
    },

    /// An action, alias, or namespace name was declared twice on one driver.
    #[error("action '{name}' is already implemented")]
    AlreadyImplemented {
        /// The colliding name.
        name: String,
    },

    /// A handler name could not be resolved to an installed handler type,
    /// either by explicit path or by naming convention.
    #[error("unknown handler type '{type_path}' for handler '{name}'; install it first")]
    UnknownHandler {
        /// The handler (or namespace) name being resolved.
        name: String,
        /// The type path that was searched for.
        type_path: String,
    },

    /// A handler name was looked up but never registered.
    #[error("handler '{name}' is invalid; maybe you need to call register_handler(\"{name}\")?")]
    InvalidHandler {
        /// The unregistered name.
        name: String,
    },

    /// Dispatch was attempted with neither a default nor an override handler
    /// set.
    #[error("no handler is set; maybe you need to call set_default_handler?")]
    NoHandler,

    /// A required option key was absent from the call arguments.
    #[error("missing parameter '{key}' for action '{action}'")]
    MissingParameter {
        /// Action whose validation failed.
        action: String,
        /// The first-declared required key that was absent.
        key: String,
    },

    /// Validation ran against positional arguments; only keyed argument maps
    /// are validatable.
    #[error("arguments for action '{action}' must be keyed, not positional")]
    InvalidArguments {
        /// Action whose validation failed.
        action: String,
    },

    /// An operation that requires a callback was invoked without one.
    #[error("can't call '{operation}' without a callback")]
    MissingBlock {
        /// The operation that was invoked.
        operation: String,
    },

    /// An action was dispatched that was never declared, or the resolved
    /// handler does not implement the declared method.
    #[error("unregistered action '{name}' for handler '{handler}'")]
    UnregisteredAction {
        /// The action or method name.
        name: String,
        /// The handler (or host) the dispatch was aimed at.
        handler: String,
    },
}
