//! Port for structured conversation logging.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics, this
//! port captures the turn transcript (requests, responses, tool calls and
//! results) in a machine-readable form such as JSONL.

use serde_json::Value;

/// A structured conversation event.
pub struct ConversationEvent {
    /// Event type (`llm_request`, `llm_response`, `tool_call`, `tool_result`, `turn_complete`).
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and non-fallible; sink failures are swallowed by the
/// adapter so they never affect a turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
