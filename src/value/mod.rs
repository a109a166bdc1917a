//! Value Model
//!
//! This module defines the data shared by every backend:
//!
//! - `types`: the `Value` union, `Key` and the `NDbKValue` pair
//! - `convert`: canonical text rendering for display and command lines
//! - `codec`: the byte encoding backends store values in
//!
//! ## Example
//!
//! ```
//! use kvbridge::value::{Value, ValueType};
//!
//! let v = Value::Array(vec![Value::from("a"), Value::Integer(2)]);
//! assert_eq!(v.value_type(), ValueType::Array);
//! assert_eq!(v.convert(",", false), "a,2");
//! ```

pub mod codec;
pub mod convert;
pub mod types;

// Re-export commonly used types for convenience
pub use codec::{decode_value, encode_value};
pub use convert::{convert_value, have_space, hex_string, string_from_hex, to_human_readable};
pub use types::{is_valid_json, Key, NDbKValue, Value, ValueType};
