//! JSON conversion for PHP values.
//!
//! This module converts a [`PhpValue`] to JSON using serde_json. Object
//! members keep the array's pair order. Enable the `serde` feature to use
//! this module.

use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::types::{ArrayKey, KeyOrder, PhpValue};

/// Convert a PHP value to a JSON value.
///
/// # Mapping Rules
///
/// | PHP Type | JSON Type |
/// |----------|-----------|
/// | `null` | `null` |
/// | `bool` | `boolean` |
/// | `int` | `number` |
/// | `float` | `number` (`null` for NaN, `"Infinity"`/`"-Infinity"`) |
/// | `string` | `string` (lossy UTF-8 conversion) |
/// | `array` (keys `0..n`) | `array` |
/// | `array` (other keys) | `object` in pair order |
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{from_bytes, to_json};
///
/// let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
/// let php_value = from_bytes(data).unwrap();
/// let json = to_json(&php_value);
/// assert_eq!(json, serde_json::json!({"name": "Alice", "age": 30}));
/// ```
pub fn to_json(value: &PhpValue) -> JsonValue {
    match value {
        PhpValue::Null => JsonValue::Null,
        PhpValue::Bool(b) => JsonValue::Bool(*b),
        PhpValue::Int(i) => json!(*i),
        PhpValue::Float(f) => {
            if f.is_nan() {
                JsonValue::Null
            } else if f.is_infinite() {
                if f.is_sign_positive() {
                    json!("Infinity")
                } else {
                    json!("-Infinity")
                }
            } else {
                json!(*f)
            }
        }
        PhpValue::String(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        PhpValue::Array(items) => {
            // Sequential integer keys starting from 0 make a JSON array
            let is_indexed = items
                .iter()
                .enumerate()
                .all(|(i, (k, _))| matches!(k, ArrayKey::Int(idx) if *idx as usize == i));

            if is_indexed {
                JsonValue::Array(items.iter().map(|(_, v)| to_json(v)).collect())
            } else {
                let mut map = Map::with_capacity(items.len());
                for (k, v) in items {
                    map.insert(k.to_string(), to_json(v));
                }
                JsonValue::Object(map)
            }
        }
    }
}

/// Convert a PHP value to JSON, ordering the top-level object by `order`.
///
/// Follows the same rules as the text report: keys that do not resolve are
/// skipped, and an empty order or a non-array value falls back to
/// [`to_json`].
pub fn to_json_ordered(value: &PhpValue, order: &KeyOrder) -> JsonValue {
    if order.is_empty() || !value.is_array() {
        return to_json(value);
    }

    let mut map = Map::with_capacity(order.len());
    for key in order {
        if let Some(v) = value.lookup(key) {
            map.insert(key.to_string(), to_json(v));
        }
    }
    JsonValue::Object(map)
}

/// A serializable inspection result: the recovered key order next to the
/// ordered value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonReport {
    /// Top-level keys in declaration order.
    pub key_order: Vec<String>,
    /// The decoded value.
    pub value: JsonValue,
}

impl JsonReport {
    /// Build a report from a decoded value and its key order.
    pub fn new(value: &PhpValue, order: &KeyOrder) -> Self {
        Self {
            key_order: order.iter().map(ToString::to_string).collect(),
            value: to_json_ordered(value, order),
        }
    }
}

/// Convert a PHP value to a JSON string.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{from_bytes, json::to_json_string};
///
/// let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
/// let php_value = from_bytes(data).unwrap();
/// let json_str = to_json_string(&php_value).unwrap();
/// assert_eq!(json_str, r#"{"name":"Alice","age":30}"#);
/// ```
pub fn to_json_string(value: &PhpValue) -> serde_json::Result<String> {
    let json = to_json(value);
    serde_json::to_string(&json)
}

/// Convert a PHP value to a pretty-printed JSON string.
pub fn to_json_string_pretty(value: &PhpValue) -> serde_json::Result<String> {
    let json = to_json(value);
    serde_json::to_string_pretty(&json)
}

#[cfg(test)]
#[allow(clippy::approx_constant)]
mod tests {
    use super::*;
    use crate::{extract_key_order, from_bytes};

    #[test]
    fn test_simple_types() {
        assert_eq!(to_json(&PhpValue::Null), JsonValue::Null);
        assert_eq!(to_json(&PhpValue::Bool(true)), JsonValue::Bool(true));
        assert_eq!(to_json(&PhpValue::Int(42)), json!(42));
        assert_eq!(to_json(&PhpValue::Float(3.14)), json!(3.14));
        assert_eq!(to_json(&PhpValue::Float(f64::NAN)), JsonValue::Null);
        assert_eq!(to_json(&PhpValue::Float(f64::NEG_INFINITY)), json!("-Infinity"));
    }

    #[test]
    fn test_indexed_array() {
        let data = b"a:2:{i:0;s:3:\"foo\";i:1;s:3:\"bar\";}";
        let value = from_bytes(data).unwrap();
        assert_eq!(to_json(&value), json!(["foo", "bar"]));
    }

    #[test]
    fn test_mixed_array() {
        // Non-sequential keys -> object
        let data = b"a:2:{i:0;s:3:\"foo\";i:5;s:3:\"bar\";}";
        let value = from_bytes(data).unwrap();
        assert_eq!(to_json(&value), json!({"0": "foo", "5": "bar"}));
    }

    #[test]
    fn test_object_keeps_pair_order() {
        let data = br#"a:3:{s:1:"z";i:1;s:1:"a";i:2;s:1:"m";i:3;}"#;
        let value = from_bytes(data).unwrap();
        assert_eq!(to_json_string(&value).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_nested() {
        let data = b"a:1:{s:4:\"user\";a:2:{s:4:\"name\";s:5:\"Alice\";s:3:\"age\";i:30;}}";
        let value = from_bytes(data).unwrap();
        assert_eq!(
            to_json(&value),
            json!({"user": {"name": "Alice", "age": 30}})
        );
    }

    #[test]
    fn test_report() {
        let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
        let value = from_bytes(data).unwrap();
        let order = extract_key_order(data).unwrap();
        let report = JsonReport::new(&value, &order);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"key_order": ["foo", "baz"], "value": {"foo": "bar", "baz": 42}})
        );
    }

    #[test]
    fn test_ordered_skips_unresolved_keys() {
        let value = from_bytes(br#"a:1:{i:3;b:1;}"#).unwrap();
        let order: KeyOrder<'_> = vec![ArrayKey::from("missing"), ArrayKey::from("3")]
            .into_iter()
            .collect();
        assert_eq!(to_json_ordered(&value, &order), json!({"3": true}));
    }
}
