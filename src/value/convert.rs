//! Text Rendering of Values
//!
//! Every value converts to one canonical, delimiter-joined string. The
//! conversion is display-only: composite values are flattened and their
//! structure cannot be recovered from the text.
//!
//! With `for_cmd` set, the output is safe to embed in a command line:
//! strings with whitespace or quotes are double-quoted and byte arrays are
//! written as quoted `\xNN` escapes, which the tokenizer reads back to the
//! same bytes.

use crate::value::types::Value;
use std::fmt;
use std::fmt::Write;

/// Renders a value as text, joining composite members with `delimiter`.
pub fn convert_value(value: &Value, delimiter: &str, for_cmd: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Double(d) => d.to_string(),
        Value::String(s) | Value::Json(s) => {
            if for_cmd {
                quote_for_cmd(s)
            } else {
                s.clone()
            }
        }
        Value::ByteArray(data) => {
            if for_cmd {
                format!("\"{}\"", hex_string(data))
            } else {
                match std::str::from_utf8(data) {
                    Ok(s) if !s.chars().any(char::is_control) => s.to_string(),
                    _ => hex_string(data),
                }
            }
        }
        Value::Array(items) | Value::Set(items) => items
            .iter()
            .map(|item| convert_value(item, delimiter, for_cmd))
            .collect::<Vec<_>>()
            .join(delimiter),
        Value::ZSet(members) => members
            .iter()
            .map(|(member, score)| {
                format!("{} {}", convert_value(member, delimiter, for_cmd), score)
            })
            .collect::<Vec<_>>()
            .join(delimiter),
        Value::Hash(fields) => fields
            .iter()
            .map(|(field, value)| {
                format!(
                    "{} {}",
                    convert_value(field, delimiter, for_cmd),
                    convert_value(value, delimiter, for_cmd)
                )
            })
            .collect::<Vec<_>>()
            .join(delimiter),
        Value::Graph | Value::SearchIndex | Value::SearchTerm => String::new(),
    }
}

/// Renders a value for display. `Null` shows as `(nil)`.
pub fn to_human_readable(value: &Value, delimiter: &str) -> String {
    match value {
        Value::Null => "(nil)".to_string(),
        other => convert_value(other, delimiter, false),
    }
}

/// Returns true if `data` contains any whitespace character.
pub fn have_space(data: &str) -> bool {
    data.chars().any(char::is_whitespace)
}

/// Renders bytes as a sequence of `\xNN` escapes.
pub fn hex_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4);
    for byte in data {
        // Writing to a String cannot fail
        let _ = write!(out, "\\x{:02x}", byte);
    }
    out
}

/// Parses a sequence of `\xNN` escapes back into bytes.
///
/// Returns `None` if the input is not a well-formed escape sequence.
pub fn string_from_hex(data: &str) -> Option<Vec<u8>> {
    let raw = data.as_bytes();
    if raw.len() % 4 != 0 {
        return None;
    }

    raw.chunks(4)
        .map(|chunk| {
            if chunk[0] != b'\\' || chunk[1] != b'x' {
                return None;
            }
            let digits = std::str::from_utf8(&chunk[2..]).ok()?;
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}

fn quote_for_cmd(s: &str) -> String {
    if !s.is_empty() && !have_space(s) && !s.contains('"') && !s.contains('\'') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Value {
    /// See [`convert_value`].
    pub fn convert(&self, delimiter: &str, for_cmd: bool) -> String {
        convert_value(self, delimiter, for_cmd)
    }

    /// See [`to_human_readable`].
    pub fn to_human_readable(&self, delimiter: &str) -> String {
        to_human_readable(self, delimiter)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_human_readable(self, " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_scalars() {
        assert_eq!(convert_value(&Value::Integer(-3), ",", false), "-3");
        assert_eq!(convert_value(&Value::Double(1.5), ",", false), "1.5");
        assert_eq!(convert_value(&Value::Boolean(true), ",", false), "true");
        assert_eq!(to_human_readable(&Value::Null, ","), "(nil)");
    }

    #[test]
    fn test_composites_use_delimiter() {
        let array = Value::Array(vec![Value::from("a"), Value::Integer(2)]);
        assert_eq!(convert_value(&array, ", ", false), "a, 2");

        let zset = Value::ZSet(vec![(Value::from("m"), 2.5)]);
        assert_eq!(convert_value(&zset, "\n", false), "m 2.5");

        let hash = Value::Hash(vec![
            (Value::from("f1"), Value::from("v1")),
            (Value::from("f2"), Value::from("v2")),
        ]);
        assert_eq!(convert_value(&hash, "\n", false), "f1 v1\nf2 v2");
    }

    #[test]
    fn test_for_cmd_quotes_spaces() {
        let v = Value::from("hello world");
        assert_eq!(convert_value(&v, " ", true), "\"hello world\"");
        assert_eq!(convert_value(&v, " ", false), "hello world");
        assert_eq!(convert_value(&Value::from("plain"), " ", true), "plain");
        assert_eq!(convert_value(&Value::from(""), " ", true), "\"\"");
    }

    #[test]
    fn test_bytes_rendering() {
        let v = Value::ByteArray(Bytes::from_static(&[0x00, 0xff]));
        assert_eq!(convert_value(&v, " ", false), "\\x00\\xff");
        assert_eq!(convert_value(&v, " ", true), "\"\\x00\\xff\"");

        let printable = Value::ByteArray(Bytes::from_static(b"abc"));
        assert_eq!(convert_value(&printable, " ", false), "abc");
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(hex_string(b"hi"), "\\x68\\x69");
        assert_eq!(string_from_hex("\\x68\\x69"), Some(b"hi".to_vec()));
        assert_eq!(string_from_hex("\\x6"), None);
        assert_eq!(string_from_hex("zz68"), None);
        assert!(have_space("a b"));
        assert!(!have_space("ab"));
    }
}
