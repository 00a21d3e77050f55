//! Tool loop progress port.
//!
//! [`ToolLoopObserver`] is an **output port** that the presentation layer
//! implements to show a turn as it happens: streamed text, tool starts and
//! completions, retries and the final message.
//!
//! All methods have default no-op implementations, so implementers only
//! need to override the callbacks they care about.

use scribe_domain::{ChatToolInvocation, ToolExecutionResult, ToolName};

pub trait ToolLoopObserver: Send + Sync {
    /// Called for each text delta streamed from the model
    fn on_llm_chunk(&self, _chunk: &str) {}

    /// Called before a call that already failed is executed again.
    /// `retry_count` is the number of earlier failures (1 on the first retry).
    fn on_retry(&self, _invocation: &ChatToolInvocation, _retry_count: u32) {}

    /// Called right before a tool is executed
    fn on_tool_start(&self, _tool_call_id: &str, _invocation: &ChatToolInvocation) {}

    /// Called for each progress line the executor reports
    fn on_tool_progress(&self, _tool_call_id: &str, _tool: ToolName, _message: &str) {}

    /// Called when a tool result is known (including rejections and timeouts)
    fn on_tool_complete(&self, _tool_call_id: &str, _tool: ToolName, _result: &ToolExecutionResult) {}

    /// Called once with the turn's final message, if any
    fn on_final_message(&self, _message: &str) {}
}

/// No-op observer for tests and headless callers
pub struct NoToolLoopProgress;

impl ToolLoopObserver for NoToolLoopProgress {}
