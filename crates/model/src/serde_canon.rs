//! Canonical JSON serialization
//!
//! Sorted map keys and stable pretty formatting so that reports diff
//! cleanly between training runs.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::collections::BTreeMap;

/// Canonicalize a JSON value by sorting all object keys recursively
fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let btree: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_value(v)))
                .collect();
            Value::Object(btree.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_value).collect()),
        other => other.clone(),
    }
}

/// Serialize a value to canonical JSON with two-space indentation
pub fn canonical_json_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonicalize_value(&serde_json::to_value(value)?);
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    canonical.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
