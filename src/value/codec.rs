//! Stored Value Encoding
//!
//! Backends only store bytes. Values are written as a marker byte followed
//! by a bincode encoding of the [`Value`], which keeps every variant intact
//! across a set/get round trip. Bytes written by other tools (no marker, or
//! a marker followed by garbage) decode as a `String` when they are valid
//! UTF-8 and as a `ByteArray` otherwise.

use crate::error::{Error, Result};
use crate::value::types::Value;
use bytes::Bytes;

/// First byte of every value written by this crate.
pub const VALUE_MARKER: u8 = 0xfe;

/// Encodes a value for storage.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let body = bincode::serialize(value)
        .map_err(|e| Error::invalid_argument(format!("cannot encode value: {}", e)))?;

    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(VALUE_MARKER);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes stored bytes back into a value.
pub fn decode_value(raw: &[u8]) -> Value {
    if let Some((&VALUE_MARKER, body)) = raw.split_first() {
        if let Ok(value) = bincode::deserialize::<Value>(body) {
            return value;
        }
    }

    match std::str::from_utf8(raw) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => Value::ByteArray(Bytes::copy_from_slice(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_survives_storage() {
        let values = vec![
            Value::Null,
            Value::Boolean(true),
            Value::Integer(i64::MIN),
            Value::Double(-0.25),
            Value::from("text with spaces"),
            Value::bytes(vec![0u8, 1, 255]),
            Value::Array(vec![Value::Integer(1), Value::from("two")]),
            Value::set(vec![Value::from("x"), Value::from("y")]),
            Value::ZSet(vec![(Value::from("m"), 3.0)]),
            Value::Hash(vec![(Value::from("f"), Value::Array(vec![Value::Null]))]),
            Value::json("[1,2,3]").unwrap(),
            Value::Graph,
            Value::SearchIndex,
            Value::SearchTerm,
        ];

        for value in values {
            let raw = encode_value(&value).unwrap();
            assert_eq!(raw[0], VALUE_MARKER);
            assert_eq!(decode_value(&raw), value);
        }
    }

    #[test]
    fn test_foreign_bytes() {
        assert_eq!(decode_value(b"plain text"), Value::from("plain text"));
        assert_eq!(
            decode_value(&[0x80, 0x81]),
            Value::bytes(vec![0x80u8, 0x81])
        );
    }
}
