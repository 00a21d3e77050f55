//! System prompts for chat turns

use crate::tool::enforcement::ChatMode;
use crate::tool::entities::ToolDefinition;

/// Templates for the per-mode system prompt and the context message
pub struct ChatPromptTemplate;

impl ChatPromptTemplate {
    /// System prompt for `mode`, listing the tools offered this turn.
    pub fn system(mode: ChatMode, tools: &[&ToolDefinition]) -> String {
        let tool_lines = tools
            .iter()
            .map(|t| format!("- {} ({}): {}", t.name, t.name.kind(), t.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mode_rules = match mode {
            ChatMode::Chat => {
                r#"You are in chat mode. You can read content and search sources, but you cannot change anything.
If the user asks for a change, explain what you would do and suggest switching to agent mode."#
            }
            ChatMode::Agent => {
                r#"You are in agent mode. You may create and edit content and ingest sources.
You may only modify content, sections and files the user referenced with @mentions in their latest message.
Work step by step: call one tool, look at the result, then decide the next step."#
            }
        };

        format!(
            r#"You are a writing assistant working inside a content workspace.

{mode_rules}

## Available Tools

{tool_lines}

When the task is done, reply to the user in plain prose without calling a tool."#
        )
    }

    /// System message carrying caller-provided context blocks.
    pub fn context(blocks: &[String]) -> Option<String> {
        let blocks: Vec<&str> = blocks
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .collect();
        if blocks.is_empty() {
            return None;
        }
        Some(format!("## Context\n\n{}", blocks.join("\n\n")))
    }
}
