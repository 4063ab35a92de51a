//! Call-argument model for dispatched actions.
//!
//! Actions are invoked with [`Args`]: either nothing, a positional list, or a
//! keyed map in the keyword-argument style. Option validation only applies to
//! keyed maps; empty arguments validate as an empty map, and positional
//! arguments are rejected outright whenever a validation spec applies.

pub use serde_json::Value;

/// A keyed argument map, preserving the caller's key/value pairs.
pub type KeyedArgs = serde_json::Map<String, Value>;

/// Arguments supplied to a dispatched action.
///
/// # Example
///
/// ```
/// use rainman::args::Args;
/// use serde_json::json;
///
/// let args = Args::keyed([("domain", json!("example.com"))]);
/// assert_eq!(args.get("domain"), Some(&json!("example.com")));
/// assert!(Args::Empty.get("domain").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Args {
    /// No arguments.
    #[default]
    Empty,
    /// Positional values. These bypass validation entirely unless a spec
    /// applies, in which case they are rejected.
    Positional(Vec<Value>),
    /// Keyword-style arguments.
    Keyed(KeyedArgs),
}

impl Args {
    /// Builds keyed arguments from `(key, value)` pairs.
    pub fn keyed<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::Keyed(map)
    }

    /// Builds positional arguments from a list of values.
    pub fn positional<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Returns `true` for keyed arguments.
    #[must_use]
    pub const fn is_keyed(&self) -> bool {
        matches!(self, Self::Keyed(_))
    }

    /// Returns the keyed map, if these arguments are keyed.
    #[must_use]
    pub const fn as_keyed(&self) -> Option<&KeyedArgs> {
        match self {
            Self::Keyed(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key in keyed arguments.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_keyed().and_then(|map| map.get(key))
    }
}

impl From<KeyedArgs> for Args {
    fn from(map: KeyedArgs) -> Self {
        Self::Keyed(map)
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}
