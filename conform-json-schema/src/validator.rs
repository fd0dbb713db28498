//! Structural validation of a fully-decoded JSON document against a schema
//! (`spec.md` §4.9).

use conform_core::{Kind, SchemaNode};
use serde_json::Value;

/// A single structural mismatch, reported with enough of a path to be
/// actionable (`SPEC_FULL.md` §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingRequiredKey { path: String, key: String },
    WrongKind { path: String, expected: Kind, found: &'static str },
    NotAnEnumMember { path: String, value: String },
    NullNotAllowed { path: String },
}

/// Walks `value` alongside `schema`, collecting every mismatch rather than
/// failing on the first (`spec.md` §4.9: "extra keys accepted ...
/// recursively"). An empty result means the document validates.
#[must_use]
pub fn validate(value: &Value, schema: &SchemaNode) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    walk(value, schema, "$", &mut errors);
    errors
}

fn walk(value: &Value, schema: &SchemaNode, path: &str, errors: &mut Vec<ValidationError>) {
    if matches!(value, Value::Null) {
        if !(schema.kind() == Kind::Any || schema.nullable()) {
            errors.push(ValidationError::NullNotAllowed { path: path.to_string() });
        }
        return;
    }

    match schema.kind() {
        Kind::Any => {}
        Kind::Object => match value {
            Value::Object(map) => {
                for key in schema.required() {
                    if !map.contains_key(key) {
                        errors.push(ValidationError::MissingRequiredKey {
                            path: path.to_string(),
                            key: key.clone(),
                        });
                    }
                }
                for (key, child_value) in map {
                    if let Some(child_schema) = schema.property(key) {
                        walk(child_value, child_schema, &format!("{path}.{key}"), errors);
                    }
                }
            }
            other => errors.push(wrong_kind(path, Kind::Object, other)),
        },
        Kind::Array => match value {
            Value::Array(items) => {
                if let Some(item_schema) = schema.items() {
                    for (i, item) in items.iter().enumerate() {
                        walk(item, item_schema, &format!("{path}[{i}]"), errors);
                    }
                }
            }
            other => errors.push(wrong_kind(path, Kind::Array, other)),
        },
        Kind::String => match value {
            Value::String(s) => {
                if let Some(allowed) = schema.enum_values() {
                    if !allowed.contains(s) {
                        errors.push(ValidationError::NotAnEnumMember {
                            path: path.to_string(),
                            value: s.clone(),
                        });
                    }
                }
            }
            other => errors.push(wrong_kind(path, Kind::String, other)),
        },
        Kind::Number => {
            if !value.is_number() {
                errors.push(wrong_kind(path, Kind::Number, value));
            }
        }
        Kind::Integer => match value.as_i64().or_else(|| value.as_u64().map(|v| v as i64)) {
            Some(_) => {}
            None => errors.push(wrong_kind(path, Kind::Integer, value)),
        },
        Kind::Boolean => {
            if !value.is_boolean() {
                errors.push(wrong_kind(path, Kind::Boolean, value));
            }
        }
        Kind::Null => {
            // Already handled by the `Value::Null` branch above; a non-null
            // value under a null-only schema is a kind mismatch.
            errors.push(wrong_kind(path, Kind::Null, value));
        }
    }
}

fn wrong_kind(path: &str, expected: Kind, found: &Value) -> ValidationError {
    ValidationError::WrongKind {
        path: path.to_string(),
        expected,
        found: value_type_name(found),
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::schema;
    use serde_json::json;

    fn schema_for(doc: Value) -> SchemaNode {
        schema::build(&doc).0
    }

    #[test]
    fn simple_object_validates() {
        let schema = schema_for(json!({
            "type": "object",
            "properties": { "name": {"type": "string"}, "age": {"type": "integer"} },
            "required": ["name"]
        }));
        let value = json!({"name": "John", "age": 30});
        assert!(validate(&value, &schema).is_empty());
    }

    #[test]
    fn missing_required_key_reported() {
        let schema = schema_for(json!({
            "type": "object",
            "properties": { "name": {"type": "string"}, "age": {"type": "integer"} },
            "required": ["name"]
        }));
        let value = json!({"age": 30});
        let errors = validate(&value, &schema);
        assert_eq!(
            errors,
            vec![ValidationError::MissingRequiredKey {
                path: "$".to_string(),
                key: "name".to_string()
            }]
        );
    }

    #[test]
    fn nested_array_of_objects_validates_recursively() {
        let schema = schema_for(json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": { "type": "object", "properties": {"id": {"type": "integer"}}, "required": ["id"] }
                }
            }
        }));
        let value = json!({"items": [{"id": 1}, {}]});
        let errors = validate(&value, &schema);
        assert_eq!(
            errors,
            vec![ValidationError::MissingRequiredKey {
                path: "$.items[1]".to_string(),
                key: "id".to_string()
            }]
        );
    }

    #[test]
    fn enum_membership_is_exact() {
        let schema = schema_for(json!({"type": "string", "enum": ["a", "b"]}));
        assert!(validate(&json!("a"), &schema).is_empty());
        assert_eq!(
            validate(&json!("c"), &schema),
            vec![ValidationError::NotAnEnumMember {
                path: "$".to_string(),
                value: "c".to_string()
            }]
        );
    }

    #[test]
    fn null_allowed_only_when_nullable_or_any() {
        let nullable = schema_for(json!({"type": ["string", "null"]}));
        assert!(validate(&json!(null), &nullable).is_empty());

        let strict = schema_for(json!({"type": "string"}));
        assert_eq!(
            validate(&json!(null), &strict),
            vec![ValidationError::NullNotAllowed { path: "$".to_string() }]
        );

        let any = schema_for(json!({}));
        assert!(validate(&json!(null), &any).is_empty());
    }
}
