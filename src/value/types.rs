//! Value, Key and Stored Item Types
//!
//! A `Value` is a tagged union over everything a backend can hold. Its
//! variant is fixed at construction; there are no setters that change it.
//!
//! Composite variants keep insertion order:
//! - `Set` is a list of distinct members
//! - `ZSet` is a list of `(member, score)` pairs
//! - `Hash` is a list of `(field, value)` pairs
//!
//! Equality is structural except for `Set`, whose members compare without
//! regard to order.

use crate::error::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    ByteArray,
    Array,
    Set,
    ZSet,
    Hash,
    Json,
    Graph,
    SearchIndex,
    SearchTerm,
}

impl ValueType {
    /// Returns the canonical type name shown to users.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::ByteArray => "byte_array",
            ValueType::Array => "array",
            ValueType::Set => "set",
            ValueType::ZSet => "zset",
            ValueType::Hash => "hash",
            ValueType::Json => "json",
            ValueType::Graph => "graph",
            ValueType::SearchIndex => "ft_index",
            ValueType::SearchTerm => "ft_term",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any storable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    ByteArray(Bytes),
    Array(Vec<Value>),
    Set(Vec<Value>),
    ZSet(Vec<(Value, f64)>),
    Hash(Vec<(Value, Value)>),
    /// Raw JSON text, validated on construction through [`Value::json`]
    Json(String),
    /// Opaque graph payload
    Graph,
    /// Full-text search index descriptor
    SearchIndex,
    /// Full-text search term/document descriptor
    SearchTerm,
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates a byte array value.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Value::ByteArray(data.into())
    }

    /// A `String` if `data` is valid UTF-8, a `ByteArray` otherwise.
    pub fn text_or_bytes(data: Bytes) -> Self {
        match std::str::from_utf8(&data) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::ByteArray(data),
        }
    }

    /// Creates a JSON value after checking that `text` parses as JSON.
    pub fn json(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !is_valid_json(&text) {
            return Err(Error::invalid_argument(format!("invalid json: {}", text)));
        }
        Ok(Value::Json(text))
    }

    /// Creates a set, dropping repeated members while keeping first-seen order.
    pub fn set(members: impl IntoIterator<Item = Value>) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for member in members {
            if !out.contains(&member) {
                out.push(member);
            }
        }
        Value::Set(out)
    }

    /// Common reply for successful write commands.
    pub fn ok() -> Self {
        Value::String("OK".to_string())
    }

    /// Creates the empty value of a given type.
    pub fn empty_of(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Null => Value::Null,
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Integer => Value::Integer(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::ByteArray => Value::ByteArray(Bytes::new()),
            ValueType::Array => Value::Array(Vec::new()),
            ValueType::Set => Value::Set(Vec::new()),
            ValueType::ZSet => Value::ZSet(Vec::new()),
            ValueType::Hash => Value::Hash(Vec::new()),
            ValueType::Json => Value::Json("{}".to_string()),
            ValueType::Graph => Value::Graph,
            ValueType::SearchIndex => Value::SearchIndex,
            ValueType::SearchTerm => Value::SearchTerm,
        }
    }

    /// Returns the discriminant of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::ByteArray(_) => ValueType::ByteArray,
            Value::Array(_) => ValueType::Array,
            Value::Set(_) => ValueType::Set,
            Value::ZSet(_) => ValueType::ZSet,
            Value::Hash(_) => ValueType::Hash,
            Value::Json(_) => ValueType::Json,
            Value::Graph => ValueType::Graph,
            Value::SearchIndex => ValueType::SearchIndex,
            Value::SearchTerm => ValueType::SearchTerm,
        }
    }

    /// Returns the string content for `String` and `Json` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Json(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, parsing strings if needed.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns the elements of an `Array` value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null)
            | (Value::Graph, Value::Graph)
            | (Value::SearchIndex, Value::SearchIndex)
            | (Value::SearchTerm, Value::SearchTerm) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) | (Value::Json(a), Value::Json(b)) => a == b,
            (Value::ByteArray(a), Value::ByteArray(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|m| b.contains(m))
                    && b.iter().all(|m| a.contains(m))
            }
            (Value::ZSet(a), Value::ZSet(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            _ => false,
        }
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Checks whether `text` is well-formed JSON.
pub fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

/// A raw byte-string key. Ordering is plain byte order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Bytes);

impl Key {
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Key(raw.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns the key as text, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Converts the key into the value used in command replies.
    pub fn to_value(&self) -> Value {
        Value::text_or_bytes(self.0.clone())
    }

    /// Splits the key into namespace segments for hierarchical display.
    ///
    /// An empty separator yields the whole key as a single segment.
    pub fn namespaces(&self, separator: &str) -> Vec<String> {
        let text = self.to_string_lossy();
        if separator.is_empty() {
            return vec![text];
        }
        text.split(separator).map(str::to_string).collect()
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(Bytes::from(s))
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Key(Bytes::copy_from_slice(b))
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Key(b)
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Key(Bytes::from(b))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// One stored item: a key together with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct NDbKValue {
    pub key: Key,
    pub value: Value,
}

impl NDbKValue {
    pub fn new(key: impl Into<Key>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// An entry whose value has not been fetched yet.
    pub fn skeleton(key: Key) -> Self {
        Self {
            key,
            value: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_is_fixed() {
        let v = Value::Integer(5);
        assert_eq!(v.value_type(), ValueType::Integer);
        let copy = v.clone();
        assert_eq!(copy, v);
        assert_eq!(copy.value_type(), ValueType::Integer);
    }

    #[test]
    fn test_empty_of_matches_type() {
        for ty in [
            ValueType::Null,
            ValueType::Boolean,
            ValueType::Integer,
            ValueType::Double,
            ValueType::String,
            ValueType::ByteArray,
            ValueType::Array,
            ValueType::Set,
            ValueType::ZSet,
            ValueType::Hash,
            ValueType::Json,
            ValueType::Graph,
            ValueType::SearchIndex,
            ValueType::SearchTerm,
        ] {
            assert_eq!(Value::empty_of(ty).value_type(), ty);
        }
    }

    #[test]
    fn test_json_validation() {
        assert!(Value::json(r#"{"a": [1, 2]}"#).is_ok());
        assert!(matches!(
            Value::json("{not json"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let xy = Value::set(vec![Value::string("x"), Value::string("y")]);
        let yx = Value::set(vec![Value::string("y"), Value::string("x")]);
        assert_eq!(xy, yx);
        assert_ne!(xy, Value::set(vec![Value::string("x")]));
        assert_ne!(xy, Value::set(vec![Value::string("x"), Value::string("z")]));

        // Other composites stay order-sensitive
        let ab = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let ba = Value::Array(vec![Value::Integer(2), Value::Integer(1)]);
        assert_ne!(ab, ba);
        assert_ne!(Value::String("a".into()), Value::Json("a".into()));
    }

    #[test]
    fn test_set_drops_duplicates() {
        let set = Value::set(vec![Value::from("a"), Value::from("b"), Value::from("a")]);
        assert_eq!(set, Value::Set(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn test_key_namespaces() {
        let key = Key::from("users:42:name");
        assert_eq!(key.namespaces(":"), vec!["users", "42", "name"]);
        assert_eq!(key.namespaces(""), vec!["users:42:name"]);
    }

    #[test]
    fn test_key_to_value() {
        assert_eq!(Key::from("k").to_value(), Value::from("k"));
        let raw = Key::from(vec![0xff, 0xfe]);
        assert_eq!(raw.to_value().value_type(), ValueType::ByteArray);
    }

    #[test]
    fn test_key_ordering_is_bytewise() {
        assert!(Key::from("a") < Key::from("b"));
        assert!(Key::from("a") < Key::from("aa"));
        assert!(Key::from("B") < Key::from("a"));
    }
}
