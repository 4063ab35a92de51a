//! Per-action and global option declarations and validation.
//!
//! An [`OptionSet`] records option declarations in registration order. An
//! action (or the driver-global scope) accumulates declarations through
//! [`OptionSet::add`]; declarations are an additive union, never a
//! replacement. [`Validations`] groups the global spec with per-action specs
//! and runs them global-first on every dispatch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::args::{Args, KeyedArgs, Value};
use crate::error::DriverError;

/// Declaration metadata for a single option key.
///
/// A bare key with no metadata is a present-but-not-required option
/// ([`OptionRule::optional`]). A default value is merged into keyed arguments
/// after validation when the caller omitted the key.
///
/// # Example
///
/// ```
/// use rainman::option::OptionRule;
/// use serde_json::json;
///
/// let rule = OptionRule::with_default(json!(1));
/// assert!(!rule.required);
/// assert_eq!(rule.default, Some(json!(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionRule {
    /// Whether the key must be present in the call's keyed arguments.
    #[serde(default)]
    pub required: bool,
    /// Value merged into the arguments when the key is absent.
    #[serde(default)]
    pub default: Option<Value>,
}

impl OptionRule {
    /// A key that must be present.
    #[must_use]
    pub const fn required() -> Self {
        Self {
            required: true,
            default: None,
        }
    }

    /// A key that may be present; no default.
    #[must_use]
    pub const fn optional() -> Self {
        Self {
            required: false,
            default: None,
        }
    }

    /// An optional key with a default merged in when absent.
    #[must_use]
    pub const fn with_default(value: Value) -> Self {
        Self {
            required: false,
            default: Some(value),
        }
    }
}

/// Option declarations for one scope, in declaration order.
///
/// Declaration order is significant: when several required keys are missing,
/// the first-declared one is reported.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    rules: Vec<(String, OptionRule)>,
}

impl OptionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a declaration. Re-adding an existing key replaces its
    /// rule in place, preserving its original position.
    pub fn add(&mut self, key: impl Into<String>, rule: OptionRule) {
        let key = key.into();
        if let Some(existing) = self.rules.iter_mut().find(|(name, _)| *name == key) {
            existing.1 = rule;
        } else {
            self.rules.push((key, rule));
        }
    }

    /// Adds a bare key: present but not required, no default.
    pub fn add_flag(&mut self, key: impl Into<String>) {
        self.add(key, OptionRule::optional());
    }

    /// Copies declarations from `other` that this set has not declared
    /// itself. Used for namespace option inheritance; local declarations
    /// shadow inherited ones.
    pub fn merge_missing(&mut self, other: &Self) {
        for (key, rule) in &other.rules {
            if !self.rules.iter().any(|(name, _)| name == key) {
                self.rules.push((key.clone(), rule.clone()));
            }
        }
    }

    /// Looks up the rule declared for a key.
    #[must_use]
    pub fn rule(&self, key: &str) -> Option<&OptionRule> {
        self.rules
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, rule)| rule)
    }

    /// Iterates required keys in declaration order.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.required)
            .map(|(name, _)| name.as_str())
    }

    /// Returns `true` when nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validates call arguments against this set.
    ///
    /// Empty arguments validate as an empty keyed map; positional arguments
    /// are always an error, independent of whether any keys are required.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArguments`] for positional arguments and
    /// [`DriverError::MissingParameter`] for the first-declared required key
    /// that is absent.
    pub fn validate(&self, action: &str, args: &Args) -> Result<(), DriverError> {
        let map = match args {
            Args::Keyed(map) => Some(map),
            Args::Empty => None,
            Args::Positional(_) => {
                return Err(DriverError::InvalidArguments {
                    action: action.to_owned(),
                });
            }
        };

        for key in self.required_keys() {
            let present = map.is_some_and(|m| m.contains_key(key));
            if !present {
                return Err(DriverError::MissingParameter {
                    action: action.to_owned(),
                    key: key.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Merges declared defaults into the arguments for keys the caller
    /// omitted. Empty arguments are promoted to a keyed map when a default
    /// applies; positional arguments are left untouched.
    pub fn apply_defaults(&self, args: &mut Args) {
        if !self.rules.iter().any(|(_, rule)| rule.default.is_some()) {
            return;
        }
        if matches!(args, Args::Positional(_)) {
            return;
        }
        if matches!(args, Args::Empty) {
            *args = Args::Keyed(KeyedArgs::new());
        }
        if let Args::Keyed(map) = args {
            for (key, rule) in &self.rules {
                if let Some(default) = &rule.default {
                    if !map.contains_key(key) {
                        map.insert(key.clone(), default.clone());
                    }
                }
            }
        }
    }
}

/// The validation specs for one dispatch scope: an optional global spec plus
/// per-action specs.
///
/// Only declared specs run. A driver that never declares options performs no
/// validation at all, so positional calls pass through; once any spec applies
/// to a call, positional arguments are rejected.
#[derive(Debug, Clone, Default)]
pub struct Validations {
    global: Option<OptionSet>,
    actions: HashMap<String, OptionSet>,
}

impl Validations {
    /// Creates an empty validation table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the global spec, if any options were declared globally.
    #[must_use]
    pub const fn global(&self) -> Option<&OptionSet> {
        self.global.as_ref()
    }

    /// Returns the global spec, creating it on first use.
    pub fn global_mut(&mut self) -> &mut OptionSet {
        self.global.get_or_insert_with(OptionSet::new)
    }

    /// Returns the spec declared for an action, if any.
    #[must_use]
    pub fn for_action(&self, name: &str) -> Option<&OptionSet> {
        self.actions.get(name)
    }

    /// Returns the spec for an action, creating it on first use.
    pub fn for_action_mut(&mut self, name: &str) -> &mut OptionSet {
        self.actions.entry(name.to_owned()).or_default()
    }

    /// Validates and normalises arguments for one action: global spec first,
    /// then the action spec, then default merging (global, then action).
    ///
    /// # Errors
    ///
    /// Propagates [`DriverError::InvalidArguments`] and
    /// [`DriverError::MissingParameter`] from the applicable specs.
    pub fn finalize(&self, action: &str, mut args: Args) -> Result<Args, DriverError> {
        if let Some(global) = &self.global {
            global.validate(action, &args)?;
        }
        if let Some(spec) = self.actions.get(action) {
            spec.validate(action, &args)?;
        }
        if let Some(global) = &self.global {
            global.apply_defaults(&mut args);
        }
        if let Some(spec) = self.actions.get(action) {
            spec.apply_defaults(&mut args);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests;
