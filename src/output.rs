//! JSON conversion for interpreter values.
//!
//! Records print as JSON when they are concatenated or displayed, filters are
//! logged as JSON, and the CLI report is JSON. All printing is deterministic:
//! object keys are sorted.
//!
//! # Examples
//!
//! ```
//! use mini4gl::Value;
//! use mini4gl::output::{to_json, to_json_pretty};
//! use std::collections::HashMap;
//!
//! let mut obj = HashMap::new();
//! obj.insert("name".to_string(), Value::from("Ann"));
//! obj.insert("id".to_string(), Value::Integer(1));
//!
//! assert_eq!(to_json(&Value::Object(obj.clone())), r#"{"id":1,"name":"Ann"}"#);
//! assert_eq!(to_json_pretty(&Value::Integer(42)), "42");
//! ```

use serde_json::{Number, Value as Json};

use crate::value::Value;

/// Compact JSON text with sorted keys.
pub fn to_json(value: &Value) -> String {
    value_to_json(value).to_string()
}

/// Two-space indented JSON text with sorted keys.
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", value_to_json(value))
}

/// Converts fixture and report JSON into interpreter values.
pub fn json_to_value(v: Json) -> Value {
    match v {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::String(s),
        Json::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        Json::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Converts an interpreter value to `serde_json`. Non-finite floats become
/// null.
pub fn value_to_json(v: &Value) -> Json {
    match v {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(arr) => Json::Array(arr.iter().map(value_to_json).collect()),
        Value::Object(obj) => Json::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}
