//! Flattening of nested filter terms into dot-delimited key paths.
//!
//! Document stores accept `{"model.triCount": 5}` far more readily than the
//! layered `{"model": {"triCount": 5}}` a client sends, so every structured
//! filter is flattened before it is checked or translated.
//!
//! ```
//! use asset_query::flatten;
//! use serde_json::json;
//!
//! let flat = flatten(&json!({ "model": { "triCount": 5 }, "name": "Gundam" }));
//! assert_eq!(flat.get("model.triCount"), Some(&json!(5)));
//! assert_eq!(flat.get("name"), Some(&json!("Gundam")));
//! ```

use serde_json::{Map, Value};

/// A single-level mapping from dot-joined key path to a leaf value.
///
/// Leaves are strings, numbers, booleans, or arrays. Objects are always
/// flattened away and `null` values are dropped, so a `FlatFilter` never
/// holds either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFilter {
    entries: Map<String, Value>,
}

impl FlatFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there are no key paths ("no filter").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the leaf stored under a key path.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// `true` if the key path is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Key paths in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(key path, leaf)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow the underlying JSON map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Convert into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }

    fn insert(&mut self, path: String, value: &Value) {
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    self.insert(format!("{path}.{key}"), child);
                }
            },
            Value::Null => {},
            leaf => {
                self.entries.insert(path, leaf.clone());
            },
        }
    }
}

impl<'a> IntoIterator for &'a FlatFilter {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<&Value> for FlatFilter {
    fn from(value: &Value) -> Self {
        flatten(value)
    }
}

/// Flatten a nested JSON value into dot-delimited key paths.
///
/// - Object values are flattened recursively and re-keyed `parent.child`.
/// - Strings, numbers, booleans and arrays are copied unchanged. Arrays below
///   the top level are leaves and are not recursed into.
/// - A top-level array is keyed by element index (`"0.a.b"`).
/// - Any other top-level value yields an empty filter.
///
/// Never fails: malformed input degrades to an empty or partial mapping.
///
/// # Example
///
/// ```
/// use asset_query::flatten;
/// use serde_json::json;
///
/// let flat = flatten(&json!([{ "a": { "b": 2 } }, { "a": { "b": 2 } }]));
/// assert_eq!(flat.into_value(), json!({ "0.a.b": 2, "1.a.b": 2 }));
///
/// assert!(flatten(&json!(1)).is_empty());
/// ```
#[must_use]
pub fn flatten(value: &Value) -> FlatFilter {
    let mut filter = FlatFilter::new();
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                filter.insert(key.clone(), child);
            }
        },
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                filter.insert(index.to_string(), item);
            }
        },
        _ => {},
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_object() {
        let flat = flatten(&json!({ "prop1": { "prop2": 2 } }));
        assert_eq!(flat.into_value(), json!({ "prop1.prop2": 2 }));
    }

    #[test]
    fn test_flatten_top_level_array() {
        let item = json!({ "prop1": { "prop2": 2 } });
        let flat = flatten(&json!([item, item]));
        assert_eq!(
            flat.into_value(),
            json!({ "0.prop1.prop2": 2, "1.prop1.prop2": 2 })
        );
    }

    #[test]
    fn test_flatten_primitives_are_empty() {
        assert!(flatten(&json!(1)).is_empty());
        assert!(flatten(&json!("Gundam")).is_empty());
        assert!(flatten(&json!(true)).is_empty());
        assert!(flatten(&Value::Null).is_empty());
    }

    #[test]
    fn test_nested_arrays_are_leaves() {
        let flat = flatten(&json!({ "name": ["Gundam", "Robot"], "tags": [{ "a": 1 }] }));
        assert_eq!(flat.get("name"), Some(&json!(["Gundam", "Robot"])));
        assert_eq!(flat.get("tags"), Some(&json!([{ "a": 1 }])));
        assert!(!flat.contains_key("tags.0.a"));
    }

    #[test]
    fn test_array_elements_at_top_level_stay_leaves() {
        let flat = flatten(&json!([[1, 2], "x"]));
        assert_eq!(flat.into_value(), json!({ "0": [1, 2], "1": "x" }));
    }

    #[test]
    fn test_null_and_empty_objects_are_dropped() {
        let flat = flatten(&json!({ "a": null, "b": {}, "c": { "d": null }, "e": false }));
        assert_eq!(flat.into_value(), json!({ "e": false }));
    }

    #[test]
    fn test_deep_nesting() {
        let flat = flatten(&json!({ "asset": { "model": { "triCount": { "lte": 3 } } } }));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["asset.model.triCount.lte"]);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let once = flatten(&json!({ "a": { "b": 2, "c": ["x"] }, "d": "e" }));
        let twice = flatten(&once.clone().into_value());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let flat = flatten(&json!({ "z": 1, "a": { "y": 2 }, "m": 3 }));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["z", "a.y", "m"]);
    }
}
