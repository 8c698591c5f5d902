use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::rule::{DefaultPolicy, FieldKind, FieldRule};
use crate::schema::ObjectSchema;

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Derive a JSON Schema document from an object schema.
///
/// Every rule and nested section maps 1:1 to a document node, preserving
/// bounds, formats, token lists, nullability, defaults, and descriptions
/// in declaration order. Computed defaults are marked with the
/// `x-computed-default` extension keyword instead of a baked-in value.
/// No data instance is required.
pub fn derive_json_schema(schema: &ObjectSchema, title: &str) -> Result<Value> {
    let mut visited = Vec::new();
    let Value::Object(node) = object_node(schema, "$", &mut visited)? else {
        unreachable!("object nodes are always JSON objects");
    };

    let mut doc = Map::new();
    doc.insert("$schema".to_string(), json!(DRAFT));
    doc.insert("title".to_string(), json!(title));
    doc.extend(node);
    Ok(Value::Object(doc))
}

fn object_node(schema: &ObjectSchema, path: &str, visited: &mut Vec<usize>) -> Result<Value> {
    // Declarative schemas are acyclic by construction; the guard keeps a
    // buggy caller from looping the walk instead of failing.
    let key = schema as *const ObjectSchema as usize;
    if visited.contains(&key) {
        return Err(Error::CyclicSchema(format!(
            "schema at {path} contains itself"
        )));
    }
    visited.push(key);

    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, rule) in schema.fields() {
        let child = rule_node(rule, &format!("{path}.{name}"), visited)?;
        properties.insert(name.to_string(), child);
        if !rule.has_default() {
            required.push(Value::String(name.to_string()));
        }
    }

    visited.pop();

    let mut node = Map::new();
    node.insert("type".to_string(), json!("object"));
    node.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        node.insert("required".to_string(), Value::Array(required));
    }
    Ok(Value::Object(node))
}

fn rule_node(rule: &FieldRule, path: &str, visited: &mut Vec<usize>) -> Result<Value> {
    let mut node = base_node(&rule.kind, path, visited)?;

    if rule.is_nullable() {
        node = nullable_node(node, &rule.kind);
    }

    match &rule.default {
        Some(DefaultPolicy::Value { value }) => {
            node.insert("default".to_string(), value.clone());
        }
        Some(DefaultPolicy::Null) => {
            node.insert("default".to_string(), Value::Null);
        }
        Some(DefaultPolicy::Today) => {
            node.insert("x-computed-default".to_string(), json!("today"));
        }
        Some(DefaultPolicy::NewId) => {
            node.insert("x-computed-default".to_string(), json!("identifier"));
        }
        Some(DefaultPolicy::CurrentYear) => {
            node.insert("x-computed-default".to_string(), json!("current-year"));
        }
        None => {}
    }

    if let Some(description) = &rule.description {
        node.insert("description".to_string(), json!(description));
    }

    Ok(Value::Object(node))
}

fn base_node(kind: &FieldKind, path: &str, visited: &mut Vec<usize>) -> Result<Map<String, Value>> {
    let mut node = Map::new();
    match kind {
        // Empty schema: accepts anything.
        FieldKind::Any => {}
        FieldKind::Text { max_len } => {
            node.insert("type".to_string(), json!("string"));
            if let Some(limit) = max_len {
                node.insert("maxLength".to_string(), json!(limit));
            }
        }
        FieldKind::Number { bounds } => {
            node.insert("type".to_string(), json!("number"));
            if let Some(min) = bounds.min {
                if bounds.exclusive_min {
                    node.insert("exclusiveMinimum".to_string(), json!(min));
                } else {
                    node.insert("minimum".to_string(), json!(min));
                }
            }
            if let Some(max) = bounds.max {
                node.insert("maximum".to_string(), json!(max));
            }
        }
        FieldKind::Integer => {
            node.insert("type".to_string(), json!("integer"));
        }
        FieldKind::Boolean => {
            node.insert("type".to_string(), json!("boolean"));
        }
        FieldKind::Date => {
            node.insert("type".to_string(), json!("string"));
            node.insert("format".to_string(), json!("date"));
        }
        FieldKind::Identifier => {
            node.insert("type".to_string(), json!("string"));
            node.insert("format".to_string(), json!("uuid"));
        }
        FieldKind::Email => {
            node.insert("type".to_string(), json!("string"));
            node.insert("format".to_string(), json!("email"));
        }
        FieldKind::Url => {
            node.insert("type".to_string(), json!("string"));
            node.insert("format".to_string(), json!("uri"));
        }
        FieldKind::Phone => {
            node.insert("type".to_string(), json!("string"));
            node.insert("format".to_string(), json!("phone"));
        }
        FieldKind::Token { tokens } => {
            node.insert("type".to_string(), json!("string"));
            node.insert("enum".to_string(), json!(tokens));
        }
        FieldKind::Array { element } => {
            node.insert("type".to_string(), json!("array"));
            let items = rule_node(element, &format!("{path}[]"), visited)?;
            node.insert("items".to_string(), items);
        }
        FieldKind::Object { schema } => {
            let Value::Object(object) = object_node(schema, path, visited)? else {
                unreachable!("object nodes are always JSON objects");
            };
            node = object;
        }
    }
    Ok(node)
}

fn nullable_node(mut node: Map<String, Value>, kind: &FieldKind) -> Map<String, Value> {
    match kind {
        // Already accepts null.
        FieldKind::Any => node,
        // Composite nodes wrap; scalar nodes widen their type.
        FieldKind::Array { .. } | FieldKind::Object { .. } => {
            let mut wrapper = Map::new();
            wrapper.insert(
                "anyOf".to_string(),
                json!([Value::Object(node), { "type": "null" }]),
            );
            wrapper
        }
        FieldKind::Token { .. } => {
            node.insert("type".to_string(), json!(["string", "null"]));
            if let Some(Value::Array(tokens)) = node.get_mut("enum") {
                tokens.push(Value::Null);
            }
            node
        }
        _ => {
            if let Some(Value::String(base)) = node.get("type").cloned() {
                node.insert("type".to_string(), json!([base, "null"]));
            }
            node
        }
    }
}
