//! Tool execution results and the per-turn history log.

use super::entities::ToolName;
use super::invocation::ChatToolInvocation;
use serde::{Deserialize, Serialize};

/// Outcome of one tool execution as reported by an executor.
///
/// The orchestrator only interprets `success` and the two correlation ids;
/// `result` is passed back to the model verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Content drafted from a source, when the tool produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_content_id: Option<String>,
    /// Content the tool created or modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl ToolExecutionResult {
    pub fn success(result: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
            source_content_id: None,
            content_id: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            source_content_id: None,
            content_id: None,
        }
    }

    /// Failure reported when an execution outlives its timeout budget.
    pub fn timed_out(tool: ToolName, seconds: u64) -> Self {
        Self::failure(format!(
            "The {} tool is taking longer than expected (over {}s). It may still finish in the background; check back shortly.",
            tool, seconds
        ))
    }

    pub fn with_content_id(mut self, id: impl Into<String>) -> Self {
        self.content_id = Some(id.into());
        self
    }

    pub fn with_source_content_id(mut self, id: impl Into<String>) -> Self {
        self.source_content_id = Some(id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

/// One attempted execution within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolHistoryEntry {
    pub tool_name: ToolName,
    pub invocation: ChatToolInvocation,
    pub result: ToolExecutionResult,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ToolHistoryEntry {
    pub fn new(invocation: ChatToolInvocation, result: ToolExecutionResult) -> Self {
        Self {
            tool_name: invocation.name(),
            invocation,
            result,
            timestamp: current_timestamp(),
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
