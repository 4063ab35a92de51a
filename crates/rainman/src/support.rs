//! Naming-convention helpers used by handler type resolution.
//!
//! Handler and namespace names are underscored symbols (`enom`,
//! `open_srs`, `nameservers`); the types implementing them are looked up
//! under camelised paths (`domain::Enom`, `domain::OpenSrs`,
//! `domain::Enom::Nameservers`).

/// Camelises an underscored name: `open_srs` becomes `OpenSrs`.
///
/// Empty segments produced by doubled or trailing underscores are skipped.
#[must_use]
pub(crate) fn camelize(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Joins a scope and a type name into a `::`-separated path.
#[must_use]
pub(crate) fn type_path(scope: &str, type_name: &str) -> String {
    format!("{scope}::{type_name}")
}
