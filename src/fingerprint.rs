//! Deterministic task fingerprints for deduplication.
//!
//! A fingerprint is the SHA-256 of the task type name and the canonical
//! form of the parameter document. Canonicalization sorts object keys
//! recursively and serializes without insignificant whitespace, so two
//! parameter documents that differ only in key order or formatting coalesce
//! onto the same in-flight task.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the dedup key for `(type_name, params)` as lowercase hex.
pub fn fingerprint(type_name: &str, params: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(type_name.as_bytes());
    // Separator keeps ("a", {"bc": 1}) distinct from ("ab", {"c": 1}).
    hasher.update([0x1f]);
    hasher.update(canonical_json(params).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Serialize a JSON value in canonical form: recursively sorted object
/// keys, compact separators.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
