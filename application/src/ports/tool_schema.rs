//! Tool schema conversion port.
//!
//! Separates "which tools to offer" (domain, by mode) from "how to serialize
//! them for the API" (infrastructure).

use scribe_domain::ToolDefinition;

/// Port for converting tool definitions to the provider's function format.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to a function JSON Schema.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert the given tools, in the given order.
    fn tools_schema(&self, tools: &[&ToolDefinition]) -> Vec<serde_json::Value> {
        tools.iter().map(|t| self.tool_to_schema(t)).collect()
    }
}
