//! Cache Value Module
//!
//! The decoded application value held by a store, plus the size estimate
//! used for byte-limit eviction.

use serde_json::Value as JsonValue;

/// Size charged for fixed-width numeric scalars
const NUMERIC_SIZE: u64 = 8;
/// Size charged for booleans
const BOOL_SIZE: u64 = 1;
/// Size charged for structured values
const STRUCTURED_SIZE: u64 = 64;

// == Value ==
/// A value owned by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Any structured value (arrays, objects, null)
    Json(JsonValue),
}

impl Value {
    // == Estimated Size ==
    /// Approximate footprint in bytes.
    ///
    /// Strings and byte buffers are charged their length, scalars a small
    /// constant, structured values a fixed default.
    pub fn estimated_size(&self) -> u64 {
        match self {
            Value::Str(s) => s.len() as u64,
            Value::Bytes(b) => b.len() as u64,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => NUMERIC_SIZE,
            Value::Bool(_) => BOOL_SIZE,
            Value::Json(_) => STRUCTURED_SIZE,
        }
    }

    /// Integer view used by counters. Non-numeric values yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Converts the value into JSON for transport.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
            Value::Int(i) => JsonValue::from(*i),
            Value::UInt(u) => JsonValue::from(*u),
            Value::Float(f) => JsonValue::from(*f),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Json(j) => j.clone(),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            other => Value::Json(other),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
