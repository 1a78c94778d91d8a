//! Parameter document validation.
//!
//! Walks a document against the JSON-Schema-like contract stored on its
//! task type. Violations are collected rather than fail-fast so the caller
//! sees the full list in one response. Nothing in a schema is ever
//! executed; `pattern` matching runs on a linear-time regex engine with a
//! compile-size cap, so caller-supplied patterns cannot blow up validation
//! time.

use crate::error::Violation;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Compiled-size cap for `pattern` regexes. The engine is linear-time in
/// the input; the cap bounds compile cost for pathological patterns.
pub(crate) const PATTERN_SIZE_LIMIT: usize = 1 << 16;

pub(crate) const KNOWN_TYPES: &[&str] = &[
    "object", "array", "string", "number", "integer", "boolean", "null",
];

/// Result of validating one document against one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

/// Validates parameter documents against task type schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `document` against `schema`, collecting every violation.
    ///
    /// Assumes the schema passed meta-validation at registration; an
    /// ill-formed keyword encountered anyway is reported as a violation
    /// rather than a crash.
    pub fn validate(&self, document: &Value, schema: &Value) -> ValidationReport {
        let mut violations = Vec::new();
        check_value(document, schema, "", &mut violations);
        ValidationReport::from_violations(violations)
    }

    /// Return a copy of `document` with schema `default`s filled in for
    /// absent properties, recursively. Runs before validation so defaulted
    /// fields are held to the same constraints.
    pub fn apply_defaults(&self, document: &Value, schema: &Value) -> Value {
        let mut filled = document.clone();
        fill_defaults(&mut filled, schema);
        filled
    }
}

fn check_value(value: &Value, schema: &Value, path: &str, violations: &mut Vec<Violation>) {
    let Some(schema_obj) = schema.as_object() else {
        violations.push(Violation::new(display_path(path), "schema is not an object"));
        return;
    };

    if let Some(expected) = schema_obj.get("type").and_then(Value::as_str) {
        if !type_matches(value, expected) {
            violations.push(Violation::new(
                display_path(path),
                format!("expected {expected}, got {}", type_name(value)),
            ));
            // Remaining keywords assume the declared type.
            return;
        }
    }

    if let Some(allowed) = schema_obj.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            violations.push(Violation::new(
                display_path(path),
                "value is not one of the allowed enum values".to_string(),
            ));
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(minimum) = schema_obj.get("minimum").and_then(Value::as_f64) {
            if number < minimum {
                violations.push(Violation::new(
                    display_path(path),
                    format!("value {number} is below minimum {minimum}"),
                ));
            }
        }
        if let Some(maximum) = schema_obj.get("maximum").and_then(Value::as_f64) {
            if number > maximum {
                violations.push(Violation::new(
                    display_path(path),
                    format!("value {number} is above maximum {maximum}"),
                ));
            }
        }
    }

    if let (Some(text), Some(pattern)) = (
        value.as_str(),
        schema_obj.get("pattern").and_then(Value::as_str),
    ) {
        match compile_pattern(pattern) {
            Ok(regex) => {
                if !regex.is_match(text) {
                    violations.push(Violation::new(
                        display_path(path),
                        format!("value does not match pattern {pattern}"),
                    ));
                }
            }
            Err(_) => {
                violations.push(Violation::new(
                    display_path(path),
                    "schema pattern failed to compile".to_string(),
                ));
            }
        }
    }

    if let Some(object) = value.as_object() {
        if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    violations.push(Violation::new(
                        child_path(path, name),
                        "required field is missing".to_string(),
                    ));
                }
            }
        }
        if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
            for (name, property_schema) in properties {
                if let Some(child) = object.get(name) {
                    check_value(child, property_schema, &child_path(path, name), violations);
                }
            }
        }
    }
}

fn fill_defaults(value: &mut Value, schema: &Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let Some(object) = value.as_object_mut() else {
        return;
    };
    for (name, property_schema) in properties {
        if !object.contains_key(name) {
            if let Some(default) = property_schema.get("default") {
                object.insert(name.clone(), default.clone());
            }
        }
        if let Some(child) = object.get_mut(name) {
            fill_defaults(child, property_schema);
        }
    }
}

/// Compile a schema `pattern` under the size cap.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

pub(crate) fn type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(path: &str, key: &str) -> String {
    format!("{path}/{key}")
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
