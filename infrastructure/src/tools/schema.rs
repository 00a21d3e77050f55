//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] producing the OpenAI
//! `tools` array entry: `{"type": "function", "function": {...}}`.

use scribe_application::ports::tool_schema::ToolSchemaPort;
use scribe_domain::ToolDefinition;
use serde_json::{Map, Value, json};

/// Handles param_type → JSON Schema type mapping:
/// - `"string"` → `"string"`
/// - `"integer"`, `"number"`, `"boolean"` → themselves
/// - `"array"` → array of strings
/// - anything else → `"string"`
///
/// `additionalProperties` is false because invocation parsing rejects
/// unknown argument fields.
pub struct JsonSchemaToolConverter;

fn parameter_schema(param_type: &str, description: &str) -> Value {
    match param_type {
        "integer" | "number" | "boolean" => json!({
            "type": param_type,
            "description": description,
        }),
        "array" => json!({
            "type": "array",
            "items": {"type": "string"},
            "description": description,
        }),
        _ => json!({
            "type": "string",
            "description": description,
        }),
    }
}

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            properties.insert(
                param.name.clone(),
                parameter_schema(&param.param_type, &param.description),
            );
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": tool.name.as_str(),
                "description": tool.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                }
            }
        })
    }
}
