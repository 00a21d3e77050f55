//! Fixed messages emitted by the tool loop

use crate::tool::entities::ToolName;

pub struct LoopMessages;

impl LoopMessages {
    /// User message appended between rounds.
    pub const CONTINUATION: &'static str = "Continue with the next step.";

    pub fn provider_failure() -> String {
        "Sorry, I ran into a problem talking to the language model and couldn't finish that. Please try again in a moment.".to_string()
    }

    pub fn iteration_limit(max_rounds: usize) -> String {
        format!(
            "I reached the maximum number of tool calls for one message ({}). Here's where things stand; send another message to keep going.",
            max_rounds
        )
    }

    /// Aggregate message for tools that kept failing.
    pub fn permanent_failure(tools: &[ToolName]) -> String {
        let mut names: Vec<&str> = tools.iter().map(|t| t.as_str()).collect();
        names.dedup();
        format!(
            "I couldn't complete this because the following tools kept failing: {}. Please check the inputs and try again.",
            names.join(", ")
        )
    }

    /// Tool message answering a call that was not executed again.
    pub fn retry_exhausted(tool: ToolName, attempts: u32) -> String {
        format!(
            "{} failed {} times with these arguments and will not be retried.",
            tool, attempts
        )
    }
}
