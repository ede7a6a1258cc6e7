//! Deep merge functionality for configuration mappings.
//!
//! Implements key-by-key merging where the override mapping wins on conflicts.
//! Sequences and scalars are replaced entirely, never concatenated.

use serde_json::Map as JsonMap;
use serde_yaml::{Mapping, Value};

/// An ordered key-value container that can take part in a deep merge.
///
/// Values of the container may themselves hold a nested container of the
/// same kind; [`OrderedMap::nested`] exposes that case so the merge can
/// recurse without knowing the concrete value type.
pub trait OrderedMap: Clone + Default {
    type Key: Clone;
    type Value: Clone;

    /// Iterate entries in insertion order.
    fn entries(&self) -> impl Iterator<Item = (&Self::Key, &Self::Value)>;

    fn lookup(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Insert or replace. Existing keys keep their position.
    fn put(&mut self, key: Self::Key, value: Self::Value);

    /// The nested mapping held by `value`, if it is one.
    fn nested(value: &Self::Value) -> Option<&Self>;

    /// Wrap a mapping back into a value.
    fn wrap(map: Self) -> Self::Value;
}

impl OrderedMap for Mapping {
    type Key = Value;
    type Value = Value;

    fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.iter()
    }

    fn lookup(&self, key: &Value) -> Option<&Value> {
        self.get(key)
    }

    fn put(&mut self, key: Value, value: Value) {
        self.insert(key, value);
    }

    fn nested(value: &Value) -> Option<&Mapping> {
        value.as_mapping()
    }

    fn wrap(map: Mapping) -> Value {
        Value::Mapping(map)
    }
}

impl OrderedMap for JsonMap<String, serde_json::Value> {
    type Key = String;
    type Value = serde_json::Value;

    fn entries(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.iter()
    }

    fn lookup(&self, key: &String) -> Option<&serde_json::Value> {
        self.get(key)
    }

    fn put(&mut self, key: String, value: serde_json::Value) {
        self.insert(key, value);
    }

    fn nested(value: &serde_json::Value) -> Option<&Self> {
        value.as_object()
    }

    fn wrap(map: Self) -> serde_json::Value {
        serde_json::Value::Object(map)
    }
}

/// Deep merge two mappings, with `overlay` taking precedence over `base`.
///
/// - When both sides hold a mapping at a key, the two are merged recursively
/// - Otherwise the overlay value replaces the base value as-is, including null
/// - Keys only present in `base` are carried through unchanged
///
/// Neither input is modified; the result is a fresh mapping.
///
/// # Example
/// ```
/// use confstack::config::deep_merge;
/// use serde_yaml::Mapping;
///
/// let base: Mapping = serde_yaml::from_str("server: {port: 8080, host: localhost}").unwrap();
/// let overlay: Mapping = serde_yaml::from_str("server: {port: 9000}").unwrap();
/// let merged = deep_merge(&base, &overlay);
/// assert_eq!(merged["server"]["port"], 9000);
/// assert_eq!(merged["server"]["host"], "localhost");
/// ```
pub fn deep_merge<M: OrderedMap>(base: &M, overlay: &M) -> M {
    let mut merged = base.clone();
    for (key, overlay_value) in overlay.entries() {
        let base_nested = base.lookup(key).and_then(M::nested);
        let value = match (base_nested, M::nested(overlay_value)) {
            // Both are mappings: merge recursively
            (Some(base_map), Some(overlay_map)) => M::wrap(deep_merge(base_map, overlay_map)),
            // Any other case: overlay replaces base entirely
            _ => overlay_value.clone(),
        };
        merged.put(key.clone(), value);
    }
    merged
}

/// Merge multiple mappings in order, with later mappings taking precedence.
///
/// Equivalent to a left fold of [`deep_merge`]; an empty input yields an empty mapping.
pub fn deep_merge_all<'a, M: OrderedMap + 'a>(maps: impl IntoIterator<Item = &'a M>) -> M {
    maps.into_iter()
        .fold(M::default(), |acc, next| deep_merge(&acc, next))
}
