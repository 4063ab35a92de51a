//! Key/value configuration bags for drivers and handlers.
//!
//! A [`ConfigStore`] holds one global bag plus one scoped bag per handler.
//! Lookup through [`ConfigStore::get`] checks the handler's own bag first and
//! falls back to the global bag, so local keys shadow global keys of the same
//! name. Handler factories receive the merged view of the two bags.

use std::collections::HashMap;

use crate::args::Value;

/// An open key/value configuration bag.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Global plus per-handler configuration storage.
///
/// # Example
///
/// ```
/// use rainman::config::ConfigStore;
/// use serde_json::json;
///
/// let mut store = ConfigStore::new();
/// store.global_mut().insert("user".into(), json!("global"));
/// store.scope_mut("enom").insert("user".into(), json!("enom_user"));
///
/// assert_eq!(store.get("enom", "user"), Some(&json!("enom_user")));
/// assert_eq!(store.get("opensrs", "user"), Some(&json!("global")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    global: ConfigMap,
    scopes: HashMap<String, ConfigMap>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the global bag.
    #[must_use]
    pub const fn global(&self) -> &ConfigMap {
        &self.global
    }

    /// Returns the global bag for mutation.
    pub const fn global_mut(&mut self) -> &mut ConfigMap {
        &mut self.global
    }

    /// Returns a handler's own bag, if one exists.
    #[must_use]
    pub fn scope(&self, name: &str) -> Option<&ConfigMap> {
        self.scopes.get(name)
    }

    /// Returns a handler's bag for mutation, creating it on first use.
    pub fn scope_mut(&mut self, name: &str) -> &mut ConfigMap {
        self.scopes.entry(name.to_owned()).or_default()
    }

    /// Looks up a key in a handler's scope, falling back to the global bag.
    #[must_use]
    pub fn get(&self, scope: &str, key: &str) -> Option<&Value> {
        self.scopes
            .get(scope)
            .and_then(|bag| bag.get(key))
            .or_else(|| self.global.get(key))
    }

    /// Returns the merged view for a handler: global keys overlaid by the
    /// handler's own, with local keys shadowing.
    #[must_use]
    pub fn merged(&self, scope: &str) -> ConfigMap {
        let mut merged = self.global.clone();
        if let Some(bag) = self.scopes.get(scope) {
            for (key, value) in bag {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}
