//! Canonical Serialization
//!
//! Deterministic string form of a JSON value, used as the sole hashing
//! and signing input for blocks. Object keys are deep-sorted so that two
//! semantically equal maps encode identically regardless of insertion
//! order; array element order is preserved.

use serde_json::Value;

/// Encode a JSON value into its canonical string form.
///
/// Pure and idempotent: `canonical_json(v) == canonical_json(v)` for all
/// values, and maps differing only in key insertion order encode the same.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let encoded: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", encoded.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let pairs: Vec<String> = keys
                .iter()
                .map(|k| {
                    let key = Value::String((*k).clone()).to_string();
                    format!("{}:{}", key, canonical_json(&map[*k]))
                })
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}
