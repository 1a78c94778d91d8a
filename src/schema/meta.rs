//! Registration-time well-formedness checks for parameter schemas.
//!
//! A schema that passes here can be walked by the validator without
//! surprises, so malformed schemas are rejected once at registration
//! instead of on every task creation.

use super::validator::{compile_pattern, type_matches, KNOWN_TYPES};
use crate::error::Violation;
use serde_json::Value;
use std::collections::HashSet;

/// Check that `schema` is a well-formed parameter contract. Returns the
/// full violation list; empty means accepted.
pub fn meta_validate(schema: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_schema(schema, "", &mut violations);
    violations
}

fn check_schema(schema: &Value, path: &str, violations: &mut Vec<Violation>) {
    let Some(obj) = schema.as_object() else {
        violations.push(Violation::new(
            display_path(path),
            "schema must be a JSON object",
        ));
        return;
    };

    if let Some(type_value) = obj.get("type") {
        match type_value.as_str() {
            Some(t) if KNOWN_TYPES.contains(&t) => {}
            Some(t) => violations.push(Violation::new(
                display_path(path),
                format!("unknown type \"{t}\""),
            )),
            None => violations.push(Violation::new(
                display_path(path),
                "\"type\" must be a string",
            )),
        }
    }

    if let Some(properties) = obj.get("properties") {
        match properties.as_object() {
            Some(map) => {
                for (name, child) in map {
                    check_schema(child, &format!("{path}/properties/{name}"), violations);
                }
            }
            None => violations.push(Violation::new(
                display_path(path),
                "\"properties\" must be an object",
            )),
        }
    }

    if let Some(required) = obj.get("required") {
        match required.as_array() {
            Some(items) => {
                let mut seen = HashSet::new();
                for item in items {
                    match item.as_str() {
                        Some(name) => {
                            if !seen.insert(name) {
                                violations.push(Violation::new(
                                    display_path(path),
                                    format!("duplicate required field \"{name}\""),
                                ));
                            }
                        }
                        None => violations.push(Violation::new(
                            display_path(path),
                            "\"required\" entries must be strings",
                        )),
                    }
                }
            }
            None => violations.push(Violation::new(
                display_path(path),
                "\"required\" must be an array",
            )),
        }
    }

    if let Some(allowed) = obj.get("enum") {
        match allowed.as_array() {
            Some(items) if items.is_empty() => violations.push(Violation::new(
                display_path(path),
                "\"enum\" must not be empty",
            )),
            Some(_) => {}
            None => violations.push(Violation::new(
                display_path(path),
                "\"enum\" must be an array",
            )),
        }
    }

    for bound in ["minimum", "maximum"] {
        if let Some(value) = obj.get(bound) {
            if !value.is_number() {
                violations.push(Violation::new(
                    display_path(path),
                    format!("\"{bound}\" must be a number"),
                ));
            }
        }
    }
    if let (Some(minimum), Some(maximum)) = (
        obj.get("minimum").and_then(Value::as_f64),
        obj.get("maximum").and_then(Value::as_f64),
    ) {
        if minimum > maximum {
            violations.push(Violation::new(
                display_path(path),
                format!("\"minimum\" ({minimum}) exceeds \"maximum\" ({maximum})"),
            ));
        }
    }

    if let Some(pattern) = obj.get("pattern") {
        match pattern.as_str() {
            Some(p) => {
                if let Err(error) = compile_pattern(p) {
                    violations.push(Violation::new(
                        display_path(path),
                        format!("invalid pattern: {error}"),
                    ));
                }
            }
            None => violations.push(Violation::new(
                display_path(path),
                "\"pattern\" must be a string",
            )),
        }
    }

    if let (Some(default), Some(declared)) =
        (obj.get("default"), obj.get("type").and_then(Value::as_str))
    {
        if KNOWN_TYPES.contains(&declared) && !type_matches(default, declared) {
            violations.push(Violation::new(
                display_path(path),
                format!("default value does not match declared type \"{declared}\""),
            ));
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
