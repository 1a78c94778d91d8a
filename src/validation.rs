//! Input bounds validation.
//!
//! Caller-supplied JSON (task parameters, completion results, schema
//! documents) is bounds-checked before any schema walking happens, so an
//! oversized or deeply nested payload is rejected cheaply.

use crate::error::{CoreError, Result};
use serde_json::Value;

/// Maximum serialized size for caller JSON payloads (1MB).
const MAX_JSON_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum nesting depth for JSON objects/arrays.
const MAX_JSON_DEPTH: usize = 10;

/// Maximum number of keys in an object or elements in an array.
const MAX_JSON_KEYS: usize = 1000;

/// Maximum length for JSON string values and object keys.
const MAX_JSON_STRING_LENGTH: usize = 10_000;

/// Validate size and structure constraints for a caller JSON document.
pub fn validate_json_bounds(value: &Value) -> Result<()> {
    let serialized = serde_json::to_string(value)
        .map_err(|e| CoreError::InvalidInput(format!("invalid JSON structure: {e}")))?;

    if serialized.len() > MAX_JSON_SIZE_BYTES {
        return Err(CoreError::InvalidInput(format!(
            "JSON payload too large: {} bytes (max: {})",
            serialized.len(),
            MAX_JSON_SIZE_BYTES
        )));
    }

    validate_json_depth(value, 0)
}

fn validate_json_depth(value: &Value, current_depth: usize) -> Result<()> {
    if current_depth > MAX_JSON_DEPTH {
        return Err(CoreError::InvalidInput(format!(
            "JSON nesting too deep: {current_depth} (max: {MAX_JSON_DEPTH})"
        )));
    }

    match value {
        Value::Object(map) => {
            if map.len() > MAX_JSON_KEYS {
                return Err(CoreError::InvalidInput(format!(
                    "too many JSON keys: {} (max: {})",
                    map.len(),
                    MAX_JSON_KEYS
                )));
            }
            for (key, val) in map {
                if key.len() > MAX_JSON_STRING_LENGTH {
                    return Err(CoreError::InvalidInput(format!(
                        "JSON key too long: {} chars (max: {})",
                        key.len(),
                        MAX_JSON_STRING_LENGTH
                    )));
                }
                validate_json_depth(val, current_depth + 1)?;
            }
        }
        Value::Array(items) => {
            if items.len() > MAX_JSON_KEYS {
                return Err(CoreError::InvalidInput(format!(
                    "JSON array too large: {} items (max: {})",
                    items.len(),
                    MAX_JSON_KEYS
                )));
            }
            for item in items {
                validate_json_depth(item, current_depth + 1)?;
            }
        }
        Value::String(s) => {
            if s.len() > MAX_JSON_STRING_LENGTH {
                return Err(CoreError::InvalidInput(format!(
                    "JSON string too long: {} chars (max: {})",
                    s.len(),
                    MAX_JSON_STRING_LENGTH
                )));
            }
        }
        _ => {} // numbers, booleans, null are always within bounds
    }

    Ok(())
}

/// Task parameters must be a bounded JSON object.
pub fn validate_task_params(params: &Value) -> Result<()> {
    validate_json_bounds(params)?;
    if params.is_object() {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(
            "task params must be a JSON object".to_string(),
        ))
    }
}

/// Completion results may be any bounded JSON value.
pub fn validate_task_result(result: &Value) -> Result<()> {
    validate_json_bounds(result)
}
