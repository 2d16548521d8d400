//! Deep merge of configuration layers.
//!
//! The base document fixes the shape of the result: an override may replace
//! the value of any key the base already has, at any depth, but keys the
//! base lacks are discarded. Nested mappings merge recursively; sequences,
//! scalars and `null` replace the base value wholesale.

use serde_json::Value;
use tracing::debug;

use crate::document::Mapping;

/// Overlay `overrides` onto `source`.
///
/// Behaviour:
/// - A mapping in `source` merges recursively with the override's value for
///   the same key when that value is a mapping. Any other override value for
///   the key is ignored so the base shape survives.
/// - A non-mapping value in `source` is replaced by the override's value when
///   the key is present there, including `null`, sequences and mappings.
/// - Keys present only in `overrides` are dropped at every level and reported
///   at `debug` level with their dotted path.
///
/// # Examples
///
/// ```rust
/// use layered_config::{Mapping, merge_mappings};
/// use serde_json::json;
///
/// let as_mapping = |value: serde_json::Value| -> Mapping {
///     serde_json::from_value(value).unwrap_or_default()
/// };
/// let base = as_mapping(json!({"x": 1, "z": {"nested": "x"}}));
/// let layer = as_mapping(json!({"x": 2, "z": {"nested2": "z"}, "extra": true}));
///
/// let merged = merge_mappings(base, layer);
/// assert_eq!(serde_json::Value::Object(merged), json!({"x": 2, "z": {"nested": "x"}}));
/// ```
#[must_use]
pub fn merge_mappings(source: Mapping, overrides: Mapping) -> Mapping {
    merge_at(&mut Vec::new(), source, overrides)
}

/// Merge two whole documents.
///
/// Inputs that are not mappings are treated as empty mappings, so the result
/// is always a mapping.
///
/// # Examples
///
/// ```rust
/// use layered_config::merge_documents;
/// use serde_json::json;
///
/// let merged = merge_documents(&json!({"tags": [1, 2]}), &json!({"tags": [3]}));
/// assert_eq!(merged, json!({"tags": [3]}));
/// assert_eq!(merge_documents(&json!([1]), &json!({"a": 1})), json!({}));
/// ```
#[must_use]
pub fn merge_documents(source: &Value, overrides: &Value) -> Value {
    let mapping = |value: &Value| value.as_object().cloned().unwrap_or_default();
    Value::Object(merge_mappings(mapping(source), mapping(overrides)))
}

fn merge_at(path: &mut Vec<String>, source: Mapping, mut overrides: Mapping) -> Mapping {
    let mut result = Mapping::new();
    for (key, value) in source {
        let replacement = overrides.remove(&key);
        let merged = match (value, replacement) {
            (Value::Object(nested), replacement) => {
                let nested_overrides = match replacement {
                    Some(Value::Object(map)) => map,
                    Some(other) => {
                        debug!(
                            key = %dotted(path, &key),
                            kind = %crate::decode::ValueKind::of(&other),
                            "ignoring override that would replace a mapping"
                        );
                        Mapping::new()
                    }
                    None => Mapping::new(),
                };
                path.push(key.clone());
                let merged = merge_at(path, nested, nested_overrides);
                path.pop();
                Value::Object(merged)
            }
            (_, Some(replacement)) => replacement,
            (value, None) => value,
        };
        result.insert(key, merged);
    }
    for key in overrides.keys() {
        debug!(key = %dotted(path, key), "ignoring key absent from the base document");
    }
    result
}

fn dotted(path: &[String], key: &str) -> String {
    let mut out = path.join(".");
    if !out.is_empty() {
        out.push('.');
    }
    out.push_str(key);
    out
}
