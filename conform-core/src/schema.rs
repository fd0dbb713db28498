//! The schema model: an immutable tree of [`SchemaNode`]s built from a JSON
//! Schema subset (`spec.md` §3, §4.1).

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::SchemaBuildError;

/// The shape a [`SchemaNode`] constrains a JSON value to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// No `type` keyword was present; anything is permitted. Also the kind
    /// collapsed subtrees (see [`SchemaBuildError`]) fall back to.
    Any,
}

/// An immutable node in the schema tree (`spec.md` §3).
///
/// Built once per request/model by [`build`] and shared by reference,
/// read-only, for the lifetime of every generation that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    kind: Kind,
    /// Nullable is modeled separately from `kind` because the wire format
    /// allows `"type": ["string", "null"]`, i.e. a primitive kind *plus*
    /// nullability, not a `Kind::Null` variant standing in for it.
    nullable: bool,
    properties: Vec<(String, SchemaNode)>,
    required: BTreeSet<String>,
    items: Option<Box<SchemaNode>>,
    enum_values: Option<BTreeSet<String>>,
}

impl SchemaNode {
    /// A permissive node equivalent to an absent or unparseable schema.
    #[must_use]
    pub fn any() -> Self {
        Self {
            kind: Kind::Any,
            nullable: false,
            properties: Vec::new(),
            required: BTreeSet::new(),
            items: None,
            enum_values: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn nullable(&self) -> bool {
        self.nullable || matches!(self.kind, Kind::Any)
    }

    /// The schema for a named property, if this node is `object`-kinded and
    /// declares it.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }

    /// Sorted keys of `properties` (`spec.md` §4.1: "`objectKeys` = sorted
    /// keys of `properties`").
    #[must_use]
    pub fn object_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.properties.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    #[must_use]
    pub fn items(&self) -> Option<&SchemaNode> {
        self.items.as_deref()
    }

    #[must_use]
    pub fn enum_values(&self) -> Option<&BTreeSet<String>> {
        self.enum_values.as_ref()
    }
}

/// Builds a [`SchemaNode`] tree from a JSON Schema subset document
/// (`spec.md` §4.1): `type`, `properties`, `required`, `items`, `enum`, and
/// arrays of `type` for nullability. Unknown keywords are ignored.
///
/// A malformed `properties` or `items` keyword does not fail the whole
/// build: the offending subtree collapses to [`SchemaNode::any`] and the
/// specific reason is returned alongside it for callers that want to
/// surface a warning.
#[must_use]
pub fn build(document: &Value) -> (SchemaNode, Vec<SchemaBuildError>) {
    let mut errors = Vec::new();
    let node = build_node(document, &mut errors);
    (node, errors)
}

fn build_node(document: &Value, errors: &mut Vec<SchemaBuildError>) -> SchemaNode {
    let Some(object) = document.as_object() else {
        return SchemaNode::any();
    };

    let (kind, nullable) = parse_type(object.get("type"));

    let properties = match object.get("properties") {
        None => Vec::new(),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(String, SchemaNode)> = map
                .iter()
                .map(|(key, schema)| (key.clone(), build_node(schema, errors)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
        }
        Some(other) => {
            errors.push(SchemaBuildError::PropertiesNotAnObject {
                found: value_type_name(other),
            });
            Vec::new()
        }
    };

    let required = object
        .get("required")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let items = match object.get("items") {
        None => None,
        Some(Value::Bool(_)) => None,
        Some(schema @ Value::Object(_)) => Some(Box::new(build_node(schema, errors))),
        Some(other) => {
            errors.push(SchemaBuildError::ItemsNotASchema {
                found: value_type_name(other),
            });
            None
        }
    };

    let enum_values = object.get("enum").and_then(Value::as_array).map(|values| {
        values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect::<BTreeSet<_>>()
    });

    SchemaNode {
        kind,
        nullable,
        properties,
        required,
        items,
        enum_values,
    }
}

fn parse_type(type_value: Option<&Value>) -> (Kind, bool) {
    match type_value {
        None => (Kind::Any, false),
        Some(Value::String(s)) => (kind_from_str(s), false),
        Some(Value::Array(variants)) => {
            let names: Vec<&str> = variants.iter().filter_map(Value::as_str).collect();
            let nullable = names.iter().any(|n| *n == "null");
            let primary = names
                .iter()
                .find(|n| **n != "null")
                .map(|n| kind_from_str(n))
                .unwrap_or(Kind::Null);
            (primary, nullable)
        }
        Some(_) => (Kind::Any, false),
    }
}

fn kind_from_str(value: &str) -> Kind {
    match value {
        "object" => Kind::Object,
        "array" => Kind::Array,
        "string" => Kind::String,
        "number" => Kind::Number,
        "integer" => Kind::Integer,
        "boolean" => Kind::Boolean,
        "null" => Kind::Null,
        _ => Kind::Any,
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
