//! Tool execution under a timeout.
//!
//! The executor runs on its own task. The loop races that task's handle
//! against a timer while forwarding progress lines; losing the race detaches
//! the task instead of cancelling it, so slow generations still land.

use crate::ports::tool_executor::{ToolExecutorPort, ToolProgress};
use crate::ports::tool_loop_observer::ToolLoopObserver;
use scribe_domain::{ChatToolInvocation, ToolExecutionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub(super) async fn execute_with_timeout<E: ToolExecutorPort + ?Sized>(
    executor: Arc<E>,
    invocation: ChatToolInvocation,
    tool_call_id: &str,
    timeout: Duration,
    observer: &dyn ToolLoopObserver,
) -> ToolExecutionResult {
    let tool = invocation.name();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<String>();

    let call_id = tool_call_id.to_string();
    let mut handle = tokio::spawn(async move {
        executor
            .execute(invocation, call_id, ToolProgress::new(progress_tx))
            .await
    });

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;
            joined = &mut handle => {
                while let Ok(message) = progress_rx.try_recv() {
                    observer.on_tool_progress(tool_call_id, tool, &message);
                }
                return match joined {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => {
                        warn!("Tool {} panicked", tool);
                        ToolExecutionResult::failure(format!("The {} tool crashed unexpectedly.", tool))
                    }
                    Err(e) => {
                        warn!("Tool {} task ended abnormally: {}", tool, e);
                        ToolExecutionResult::failure(format!("The {} tool was interrupted.", tool))
                    }
                };
            }
            Some(message) = progress_rx.recv() => {
                debug!("{} progress: {}", tool, message);
                observer.on_tool_progress(tool_call_id, tool, &message);
            }
            _ = &mut deadline => {
                warn!(
                    "Tool {} ({}) exceeded {}s; leaving it running in the background",
                    tool,
                    tool_call_id,
                    timeout.as_secs()
                );
                return ToolExecutionResult::timed_out(tool, timeout.as_secs());
            }
        }
    }
}
