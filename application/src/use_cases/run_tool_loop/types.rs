//! Input, output and termination types for the tool loop.

use scribe_domain::{ChatMessage, ChatMode, ReferenceScope, ToolHistoryEntry};
use serde::Serialize;
use std::fmt;

/// Input for one chat turn.
#[derive(Debug, Clone)]
pub struct RunToolLoopInput {
    pub user_message: String,
    /// Prior conversation, oldest first. Never modified by the loop.
    pub history: Vec<ChatMessage>,
    pub mode: ChatMode,
    /// Entities mentioned in this turn's message.
    pub scope: ReferenceScope,
    /// Extra context rendered into a system message (resolved mentions, etc).
    pub context_blocks: Vec<String>,
}

impl RunToolLoopInput {
    pub fn new(user_message: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            user_message: user_message.into(),
            history: Vec::new(),
            mode,
            scope: ReferenceScope::new(),
            context_blocks: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_scope(mut self, scope: ReferenceScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_context_block(mut self, block: impl Into<String>) -> Self {
        self.context_blocks.push(block.into());
        self
    }
}

/// Why a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model replied without calling tools.
    Completed,
    /// The provider failed to open or finish a stream.
    ProviderFailure,
    /// At least one call exhausted its retries.
    PermanentToolFailure,
    /// Every round was used.
    IterationLimit,
    /// The caller cancelled the turn.
    Cancelled,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Completed => "completed",
            TerminationReason::ProviderFailure => "provider_failure",
            TerminationReason::PermanentToolFailure => "permanent_tool_failure",
            TerminationReason::IterationLimit => "iteration_limit",
            TerminationReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one chat turn. Every failure path ends here; nothing is raised.
#[derive(Debug, Clone, Serialize)]
pub struct ToolLoopOutput {
    /// User-facing reply, if the turn produced one.
    pub final_message: Option<String>,
    /// Every attempted execution, in order.
    pub tool_history: Vec<ToolHistoryEntry>,
    /// Messages this turn added after the user message.
    pub messages: Vec<ChatMessage>,
    pub termination: TerminationReason,
    pub rounds: usize,
    /// Latest content id reported by a successful tool.
    pub content_id: Option<String>,
    /// Latest source-derived content id reported by a successful tool.
    pub source_content_id: Option<String>,
}

impl ToolLoopOutput {
    pub fn is_completed(&self) -> bool {
        self.termination == TerminationReason::Completed
    }
}
