//! Request and response field mapping from JSON schemas.
//!
//! Both walkers visit object properties in document order, so the first
//! match in declaration order wins.

use serde_json::{json, Map, Value};

use crate::config::PROMPT_PLACEHOLDER;

/// String fields that can carry the prompt, in priority order
pub const PROMPT_FIELDS: &[&str] = &["message", "prompt", "content", "input", "text", "query"];

/// Field names that hold reply text
pub const REPLY_FIELDS: &[&str] = &["content", "text", "message"];

const MAX_DEPTH: usize = 10;

/// Where and how the prompt goes into the request body
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMapping {
    /// Top-level property that receives the prompt
    pub prompt_field: String,
    /// Body skeleton holding the `{prompt}` placeholder
    pub template: Map<String, Value>,
}

fn properties(schema: &Value) -> Option<&Map<String, Value>> {
    schema.get("properties").and_then(Value::as_object)
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn variants(schema: &Value) -> impl Iterator<Item = &Value> {
    ["oneOf", "anyOf", "allOf"]
        .into_iter()
        .filter_map(|key| schema.get(key).and_then(Value::as_array))
        .flatten()
}

/// Whether a schema admits a string value
pub fn admits_string(schema: &Value) -> bool {
    let types = declared_types(schema);
    if types.contains(&"string") {
        return true;
    }
    let has_variants = variants(schema).next().is_some();
    if has_variants {
        return variants(schema).any(admits_string);
    }
    types.is_empty() && properties(schema).is_none() && schema.get("items").is_none()
}

fn is_primitive(schema: &Value) -> bool {
    let types = declared_types(schema);
    !types.is_empty()
        && types
            .iter()
            .all(|t| matches!(*t, "string" | "number" | "integer" | "boolean" | "null"))
}

fn is_array_of_objects(schema: &Value) -> bool {
    declared_types(schema).contains(&"array")
        && schema.get("items").map(|items| !is_primitive(items)).unwrap_or(false)
}

/// Find the prompt injection point in a request body schema
pub fn find_prompt_field(schema: &Value) -> Option<PromptMapping> {
    let props = properties(schema)?;

    if props.get("messages").map(is_array_of_objects).unwrap_or(false) {
        let mut template = Map::new();
        template.insert(
            "messages".to_string(),
            json!([{"role": "user", "content": PROMPT_PLACEHOLDER}]),
        );
        return Some(PromptMapping {
            prompt_field: "messages".to_string(),
            template,
        });
    }

    PROMPT_FIELDS
        .iter()
        .find(|name| props.get(**name).map(admits_string).unwrap_or(false))
        .map(|name| {
            let mut template = Map::new();
            template.insert(name.to_string(), Value::String(PROMPT_PLACEHOLDER.to_string()));
            PromptMapping {
                prompt_field: name.to_string(),
                template,
            }
        })
}

/// Find the dot-path of the reply text in a response schema.
///
/// Depth-first and pre-order: a matching string property is returned before
/// its later siblings are looked at, and a non-matching property is fully
/// explored before moving on.
pub fn find_reply_path(schema: &Value) -> Option<String> {
    let mut path = Vec::new();
    walk_reply(schema, &mut path, 0)
}

fn walk_reply(schema: &Value, path: &mut Vec<String>, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }

    if let Some(props) = properties(schema) {
        for (name, prop) in props {
            path.push(name.clone());
            if REPLY_FIELDS.contains(&name.as_str()) && admits_string(prop) {
                return Some(path.join("."));
            }
            if let Some(found) = walk_reply(prop, path, depth + 1) {
                return Some(found);
            }
            path.pop();
        }
    }

    if let Some(items) = schema.get("items") {
        path.push("0".to_string());
        if let Some(found) = walk_reply(items, path, depth + 1) {
            return Some(found);
        }
        path.pop();
    }

    for variant in variants(schema) {
        if let Some(found) = walk_reply(variant, path, depth + 1) {
            return Some(found);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_array_of_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "model": {"type": "string"},
                "messages": {"type": "array", "items": {"oneOf": [{"type": "object"}]}}
            }
        });
        let mapping = find_prompt_field(&schema).unwrap();

        assert_eq!(mapping.prompt_field, "messages");
        assert_eq!(
            Value::Object(mapping.template),
            json!({"messages": [{"role": "user", "content": "{prompt}"}]})
        );
    }

    #[test]
    fn test_messages_of_strings_falls_through() {
        let schema = json!({
            "properties": {
                "messages": {"type": "array", "items": {"type": "string"}},
                "prompt": {"type": "string"}
            }
        });
        assert_eq!(find_prompt_field(&schema).unwrap().prompt_field, "prompt");
    }

    #[test]
    fn test_string_field_priority() {
        let schema = json!({
            "properties": {
                "query": {"type": "string"},
                "message": {"type": "string"}
            }
        });
        let mapping = find_prompt_field(&schema).unwrap();
        assert_eq!(mapping.prompt_field, "message");
        assert_eq!(Value::Object(mapping.template), json!({"message": "{prompt}"}));
    }

    #[test]
    fn test_input_accepting_string_variant() {
        let schema = json!({
            "properties": {
                "input": {"oneOf": [{"type": "string"}, {"type": "array", "items": {"type": "string"}}]}
            }
        });
        assert_eq!(find_prompt_field(&schema).unwrap().prompt_field, "input");
    }

    #[test]
    fn test_no_prompt_field() {
        let schema = json!({"properties": {"prompt": {"type": "integer"}, "model": {"type": "string"}}});
        assert!(find_prompt_field(&schema).is_none());
        assert!(find_prompt_field(&json!({"type": "string"})).is_none());
    }

    #[test]
    fn test_reply_path_openai_shape() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "choices": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "index": {"type": "integer"},
                            "message": {
                                "type": "object",
                                "properties": {
                                    "role": {"type": "string"},
                                    "content": {"type": "string", "nullable": true}
                                }
                            }
                        }
                    }
                }
            }
        });
        assert_eq!(find_reply_path(&schema).unwrap(), "choices.0.message.content");
    }

    #[test]
    fn test_reply_path_through_one_of_blocks() {
        let schema = json!({
            "properties": {
                "id": {"type": "string"},
                "content": {
                    "type": "array",
                    "items": {
                        "oneOf": [
                            {"properties": {"type": {"type": "string"}, "text": {"type": "string"}}},
                            {"properties": {"input": {"type": "object"}}}
                        ]
                    }
                }
            }
        });
        assert_eq!(find_reply_path(&schema).unwrap(), "content.0.text");
    }

    #[test]
    fn test_reply_path_first_in_traversal_order_wins() {
        let schema = json!({
            "properties": {
                "result": {"properties": {"text": {"type": "string"}}},
                "message": {"type": "string"}
            }
        });
        assert_eq!(find_reply_path(&schema).unwrap(), "result.text");
    }

    #[test]
    fn test_reply_path_top_level_and_missing() {
        let schema = json!({"properties": {"text": {"type": ["string", "null"]}}});
        assert_eq!(find_reply_path(&schema).unwrap(), "text");

        let schema = json!({"properties": {"id": {"type": "string"}, "score": {"type": "number"}}});
        assert!(find_reply_path(&schema).is_none());
    }
}
