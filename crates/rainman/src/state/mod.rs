//! Per-driver dispatch state: default handler, override, instance cache.
//!
//! A [`HandlerState`] is owned exclusively by the driver that carries it and
//! is never shared between drivers built from the same declarations — the
//! isolation invariant. The current handler is the override when one is set,
//! otherwise the default.
//!
//! Scoped overrides use [`OverrideGuard`]: the guard captures the displaced
//! override on construction and restores exactly that value on `Drop`, so
//! restoration happens on normal exit, early return, error, and unwind alike,
//! and stacked guards unwind LIFO.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::debug;

use crate::handler::Handler;

/// Tracing target for dispatch-state transitions.
const STATE_TARGET: &str = "rainman::state";

/// Mutable dispatch state for one driver.
#[derive(Default)]
pub struct HandlerState {
    default: Option<String>,
    current: Option<String>,
    instances: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerState {
    /// Creates state with no default, no override, and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default handler name, if set.
    #[must_use]
    pub fn default_handler(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Sets the default handler name. Registry validation is the caller's
    /// concern.
    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = Some(name.into());
    }

    /// Returns the active override, if one is set.
    #[must_use]
    pub fn override_handler(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Sets or clears the sticky override.
    pub fn set_override(&mut self, name: Option<String>) {
        self.current = name;
    }

    /// Swaps the override, returning the displaced value.
    pub(crate) fn swap_override(&mut self, name: Option<String>) -> Option<String> {
        mem::replace(&mut self.current, name)
    }

    /// Returns the current handler: the override if set, else the default.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref().or(self.default.as_deref())
    }

    /// Returns the memoized instance for a handler, if one was created.
    #[must_use]
    pub fn cached_instance(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.instances.get(name).cloned()
    }

    /// Memoizes a handler instance.
    pub fn cache_instance(&mut self, name: impl Into<String>, instance: Arc<dyn Handler>) {
        self.instances.insert(name.into(), instance);
    }

    /// Drops the memoized instance for one handler; the next dispatch
    /// constructs a fresh one.
    pub fn invalidate(&mut self, name: &str) {
        self.instances.remove(name);
    }

    /// Drops every memoized instance.
    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }
}

impl fmt::Debug for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerState")
            .field("default", &self.default)
            .field("current", &self.current)
            .field("cached_instances", &self.instances.len())
            .finish()
    }
}

/// Scoped override with guaranteed restoration.
///
/// Construction swaps the override in; `Drop` swaps the displaced value back.
/// Guards never hold a borrow between those two points, so nested guards on
/// the same state are safe and unwind in LIFO order.
#[must_use = "dropping the guard immediately restores the prior handler"]
pub struct OverrideGuard<'a> {
    state: &'a RefCell<HandlerState>,
    prior: Option<String>,
}

impl<'a> OverrideGuard<'a> {
    /// Activates an override, capturing whatever it displaced.
    pub fn activate(state: &'a RefCell<HandlerState>, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(target: STATE_TARGET, handler = %name, "entering scoped override");
        let prior = state.borrow_mut().swap_override(Some(name));
        Self { state, prior }
    }
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        let prior = self.prior.take();
        debug!(
            target: STATE_TARGET,
            restored = prior.as_deref().unwrap_or("<default>"),
            "leaving scoped override"
        );
        self.state.borrow_mut().swap_override(prior);
    }
}
