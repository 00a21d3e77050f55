//! Tool Executor port
//!
//! Defines the interface for executing parsed tool invocations. The
//! orchestrator never knows what a tool does; it hands the invocation to
//! this port and interprets only the returned [`ToolExecutionResult`].

use async_trait::async_trait;
use scribe_domain::{ChatToolInvocation, ToolExecutionResult};
use tokio::sync::mpsc;

/// Sink for human-readable progress lines emitted while a tool runs.
///
/// Cloneable and cheap. Sends after the orchestrator stopped listening
/// (for example after a timeout) are dropped.
#[derive(Debug, Clone)]
pub struct ToolProgress {
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl ToolProgress {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Progress sink that discards everything.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn report(&self, message: impl Into<String>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(message.into());
        }
    }
}

/// Port for tool execution
///
/// Executions are spawned onto the runtime so they can outlive a timeout,
/// hence the `'static` bound and owned arguments.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync + 'static {
    /// Execute a tool call. Failures are reported in the result, never raised.
    async fn execute(
        &self,
        invocation: ChatToolInvocation,
        tool_call_id: String,
        progress: ToolProgress,
    ) -> ToolExecutionResult;
}
