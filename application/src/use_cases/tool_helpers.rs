//! Shared helpers for tool use cases.

use scribe_domain::{ChatToolInvocation, ToolExecutionResult};

/// Short preview of an invocation's most telling argument.
///
/// Looks for well-known keys (`sectionId`, `contentId`, `sourceId`, `url`,
/// `query`) first, then falls back to the first string value found.
pub fn invocation_preview(invocation: &ChatToolInvocation) -> String {
    let arguments = invocation.arguments();
    let Some(object) = arguments.as_object() else {
        return String::new();
    };
    let keys = ["sectionId", "contentId", "sourceId", "url", "query"];
    for key in &keys {
        if let Some(serde_json::Value::String(s)) = object.get(*key) {
            return truncate_preview(s, 50);
        }
    }
    object
        .values()
        .find_map(|v| v.as_str())
        .map(|s| truncate_preview(s, 50))
        .unwrap_or_default()
}

/// Body of the `tool` message answering one call.
pub fn tool_message_content(result: &ToolExecutionResult) -> String {
    let mut summary = serde_json::json!({ "success": result.success });
    if let Some(value) = &result.result {
        summary["result"] = value.clone();
    }
    if let Some(error) = &result.error {
        summary["error"] = serde_json::Value::String(error.clone());
    }
    summary.to_string()
}

fn truncate_preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
