//! Manifest value tree
//!
//! `Value` is the input to the YAML serializer. Mapping entries hold
//! `Option<Value>` so that a key which was never set (`None`, omitted from
//! output) stays distinguishable from a key explicitly set to null
//! (`Some(Value::Null)`, rendered as `null`).

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A numeric scalar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Integer value, if this number has no fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_nan() => f.write_str(".nan"),
            Number::Float(x) if x.is_infinite() => {
                f.write_str(if x > 0.0 { ".inf" } else { "-.inf" })
            }
            // Whole floats print like integers: 2.0 -> "2"
            Number::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x as i64),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A manifest value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// True for containers that render as an indented block: a non-empty
    /// sequence, or a mapping with at least one present entry.
    pub fn is_block(&self) -> bool {
        match self {
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(map) => map.present_len() > 0,
            _ => false,
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Walk mappings by key and sequences by decimal index
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };

        let next = match self {
            Value::Mapping(map) => map.get(head),
            Value::Sequence(items) => head.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }?;

        next.get_path(rest)
    }

    /// Get a value by dotted path (e.g., "spec.template.metadata")
    pub fn pointer(&self, dotted: &str) -> Option<&Value> {
        let parts: Vec<&str> = dotted.split('.').collect();
        self.get_path(&parts)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::yaml::to_yaml(self, 0))
    }
}

/// Ordered mapping from keys to possibly-absent values
///
/// Insertion order is preserved and is the order keys are rendered in.
/// Re-inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping(IndexMap<String, Option<Value>>);

impl Mapping {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Insert a present value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), Some(value.into()));
    }

    /// Insert a value that may be absent; `None` is kept as an absent entry
    pub fn insert_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        self.0.insert(key.into(), value.map(Into::into));
    }

    /// Builder-style `insert`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style `insert_opt`
    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Get a present value; absent entries read as missing
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key).and_then(Option::as_mut)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key).flatten()
    }

    /// Number of entries, absent ones included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries that carry a value
    pub fn present_len(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    /// All entries, absent ones included
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Entries that carry a value
    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::Int(i64::from(n)))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => Value::Number(Number::Int(i)),
            Err(_) => Value::Number(Number::Float(n as f64)),
        }
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::from(n as u64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Mapping(map.into_iter().collect())
    }
}

impl From<&BTreeMap<String, String>> for Value {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Value::Mapping(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(obj) => {
                Value::Mapping(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.present_len()))?;
        for (k, v) in self.present() {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_display() {
        assert_eq!(Number::Int(80).to_string(), "80");
        assert_eq!(Number::Int(-3).to_string(), "-3");
        assert_eq!(Number::Float(2.0).to_string(), "2");
        assert_eq!(Number::Float(1.5).to_string(), "1.5");
        assert_eq!(Number::Float(0.25).to_string(), "0.25");
        assert_eq!(Number::Float(f64::NAN).to_string(), ".nan");
        assert_eq!(Number::Float(f64::INFINITY).to_string(), ".inf");
        assert_eq!(Number::Float(f64::NEG_INFINITY).to_string(), "-.inf");
    }

    #[test]
    fn test_absent_and_null_are_distinct() {
        let map = Mapping::new()
            .with_opt("a", None::<Value>)
            .with("b", Value::Null);

        assert_eq!(map.len(), 2);
        assert_eq!(map.present_len(), 1);
        assert!(map.get("a").is_none());
        assert_eq!(map.get("b"), Some(&Value::Null));
        assert!(!map.contains_key("a"));
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut map = Mapping::new().with("first", 1).with("second", 2);
        map.insert("first", 10);

        let keys: Vec<&str> = map.present().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(map.get("first").and_then(Value::as_i64), Some(10));
    }

    #[test]
    fn test_is_block() {
        assert!(!Value::Sequence(vec![]).is_block());
        assert!(Value::from(vec![1]).is_block());
        assert!(!Value::Mapping(Mapping::new()).is_block());
        assert!(!Value::Mapping(Mapping::new().with_opt("x", None::<i32>)).is_block());
        assert!(Value::Mapping(Mapping::new().with("x", 1)).is_block());
        assert!(!Value::from("text").is_block());
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(json!({
            "spec": {
                "ports": [{"port": 80}, {"port": 443}]
            }
        }));

        assert_eq!(
            value.get_path(&["spec", "ports", "1", "port"]).and_then(Value::as_i64),
            Some(443)
        );
        assert_eq!(value.pointer("spec.ports.0.port").and_then(Value::as_i64), Some(80));
        assert!(value.get_path(&["spec", "ports", "x"]).is_none());
        assert!(value.get_path(&["spec", "missing"]).is_none());
    }

    #[test]
    fn test_from_json_preserves_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .present()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(3)), Value::Number(Number::Int(3)));
        assert_eq!(Value::from(json!(1.5)), Value::Number(Number::Float(1.5)));
    }

    #[test]
    fn test_serialize_skips_absent() {
        let map = Mapping::new()
            .with("name", "web")
            .with_opt("namespace", None::<String>)
            .with("replicas", 2);

        let json = serde_json::to_string(&Value::Mapping(map)).unwrap();
        assert_eq!(json, r#"{"name":"web","replicas":2}"#);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
