//! JSON Schema $ref resolver for OpenAPI specs

use indexmap::IndexMap;
use serde_json::Value;

const SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Resolves `#/components/schemas/...` references in JSON schemas.
///
/// Self-referencing schemas are expanded once; the inner occurrence keeps its
/// `$ref` so the result stays finite.
pub struct SchemaResolver<'a> {
    /// Component schemas from the OpenAPI spec
    schemas: &'a IndexMap<String, Value>,
    /// Maximum nesting depth to expand
    max_depth: usize,
}

impl<'a> SchemaResolver<'a> {
    /// Create a new resolver with the given component schemas
    pub fn new(schemas: &'a IndexMap<String, Value>) -> Self {
        Self {
            schemas,
            max_depth: 10,
        }
    }

    /// Resolve a schema, following $ref references
    pub fn resolve(&self, schema: &Value) -> Value {
        let mut visiting = Vec::new();
        self.resolve_with_depth(schema, 0, &mut visiting)
    }

    fn resolve_with_depth(&self, schema: &Value, depth: usize, visiting: &mut Vec<String>) -> Value {
        if depth > self.max_depth {
            return schema.clone();
        }

        let Value::Object(obj) = schema else {
            return schema.clone();
        };

        if let Some(name) = obj
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix(SCHEMA_PREFIX))
        {
            if visiting.iter().any(|v| v == name) {
                return schema.clone();
            }
            if let Some(target) = self.schemas.get(name) {
                visiting.push(name.to_string());
                let resolved = self.resolve_with_depth(target, depth + 1, visiting);
                visiting.pop();
                return resolved;
            }
            return schema.clone();
        }

        let mut result = serde_json::Map::new();
        for (key, value) in obj {
            let resolved = match key.as_str() {
                "properties" => self.resolve_properties(value, depth, visiting),
                "items" => self.resolve_with_depth(value, depth + 1, visiting),
                "additionalProperties" if value.is_object() => {
                    self.resolve_with_depth(value, depth + 1, visiting)
                }
                "allOf" | "oneOf" | "anyOf" => self.resolve_array(value, depth, visiting),
                _ => value.clone(),
            };
            result.insert(key.clone(), resolved);
        }
        Value::Object(result)
    }

    fn resolve_properties(&self, value: &Value, depth: usize, visiting: &mut Vec<String>) -> Value {
        match value.as_object() {
            Some(obj) => Value::Object(
                obj.iter()
                    .map(|(key, prop)| (key.clone(), self.resolve_with_depth(prop, depth + 1, visiting)))
                    .collect(),
            ),
            None => value.clone(),
        }
    }

    fn resolve_array(&self, value: &Value, depth: usize, visiting: &mut Vec<String>) -> Value {
        match value.as_array() {
            Some(arr) => Value::Array(
                arr.iter()
                    .map(|item| self.resolve_with_depth(item, depth + 1, visiting))
                    .collect(),
            ),
            None => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_ref() {
        let mut schemas = IndexMap::new();
        schemas.insert(
            "Message".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "role": {"type": "string"},
                    "content": {"type": "string"}
                }
            }),
        );
        schemas.insert(
            "Choice".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "index": {"type": "integer"},
                    "message": {"$ref": "#/components/schemas/Message"}
                }
            }),
        );

        let resolver = SchemaResolver::new(&schemas);
        let schema = json!({
            "type": "object",
            "properties": {
                "choices": {"type": "array", "items": {"$ref": "#/components/schemas/Choice"}}
            }
        });
        let resolved = resolver.resolve(&schema);

        let message = &resolved["properties"]["choices"]["items"]["properties"]["message"];
        assert_eq!(message["type"], "object");
        assert_eq!(message["properties"]["content"]["type"], "string");
    }

    #[test]
    fn test_resolve_one_of_variants() {
        let mut schemas = IndexMap::new();
        schemas.insert(
            "TextBlock".to_string(),
            json!({"type": "object", "properties": {"text": {"type": "string"}}}),
        );

        let resolver = SchemaResolver::new(&schemas);
        let schema = json!({"oneOf": [{"$ref": "#/components/schemas/TextBlock"}, {"type": "null"}]});
        let resolved = resolver.resolve(&schema);

        assert_eq!(resolved["oneOf"][0]["properties"]["text"]["type"], "string");
        assert_eq!(resolved["oneOf"][1]["type"], "null");
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut schemas = IndexMap::new();
        schemas.insert(
            "Node".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                }
            }),
        );

        let resolver = SchemaResolver::new(&schemas);
        let resolved = resolver.resolve(&json!({"$ref": "#/components/schemas/Node"}));

        assert_eq!(resolved["type"], "object");
        assert_eq!(
            resolved["properties"]["children"]["items"]["$ref"],
            "#/components/schemas/Node"
        );
    }

    #[test]
    fn test_unknown_ref_is_left_in_place() {
        let schemas = IndexMap::new();
        let resolver = SchemaResolver::new(&schemas);
        let schema = json!({"$ref": "#/components/schemas/Missing"});
        assert_eq!(resolver.resolve(&schema), schema);
    }
}
