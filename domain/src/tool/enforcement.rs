//! Registry, mode and reference-scope enforcement.
//!
//! Checked by the orchestrator before every dispatch, independent of which
//! tools the model was offered: models can and do call tools they were not
//! given.

use super::entities::{ToolDefinition, ToolKind, ToolName, ToolRegistry};
use super::invocation::ChatToolInvocation;
use crate::core::error::DomainError;
use crate::reference::scope::ReferenceScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat session mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Read-only conversation about the workspace.
    #[default]
    Chat,
    /// Full tool access, including writes and ingestion.
    Agent,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Chat => "chat",
            ChatMode::Agent => "agent",
        }
    }

    /// Tool kinds exposed to the model in this mode.
    pub fn exposed_kinds(&self) -> &'static [ToolKind] {
        match self {
            ChatMode::Chat => &[ToolKind::Read],
            ChatMode::Agent => &[ToolKind::Read, ToolKind::Write, ToolKind::Ingest],
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(ChatMode::Chat),
            "agent" => Ok(ChatMode::Agent),
            other => Err(DomainError::InvalidMode(format!(
                "'{}' (expected chat or agent)",
                other
            ))),
        }
    }
}

/// Definitions to offer the model in `mode`.
pub fn tools_for_mode(registry: &ToolRegistry, mode: ChatMode) -> Vec<&ToolDefinition> {
    registry.tools_by_kind(mode.exposed_kinds())
}

/// False iff `mode` is chat and the tool writes or ingests.
pub fn is_tool_allowed_in_mode(name: ToolName, mode: ChatMode) -> bool {
    !(mode == ChatMode::Chat && name.kind().is_mutating())
}

/// What the enforcer needs to know about the current turn.
#[derive(Debug, Clone, Copy)]
pub struct EnforcementContext<'a> {
    pub mode: ChatMode,
    pub scope: &'a ReferenceScope,
}

impl<'a> EnforcementContext<'a> {
    pub fn new(mode: ChatMode, scope: &'a ReferenceScope) -> Self {
        Self { mode, scope }
    }
}

pub fn mode_error_message(name: ToolName) -> String {
    format!(
        "The {} tool can't be used in chat mode. Switch to agent mode to make changes.",
        name
    )
}

pub fn unregistered_tool_message(name: ToolName) -> String {
    format!(
        "The {} tool isn't available in this workspace. Use one of the tools you were given.",
        name
    )
}

fn not_referenced(thing: &str, id: &str) -> String {
    format!(
        "The {} ({}) wasn't referenced in your message. Add @<{}> to allow this change.",
        thing, id, thing
    )
}

/// User-facing reason the call is not permitted, or `None` when it is.
///
/// Order: mode first, then (agent mode only) the mention scope of mutating
/// tools. Tools without a scope rule pass.
pub fn reference_scope_error(
    invocation: &ChatToolInvocation,
    ctx: EnforcementContext<'_>,
) -> Option<String> {
    let name = invocation.name();
    if !is_tool_allowed_in_mode(name, ctx.mode) {
        return Some(mode_error_message(name));
    }
    if ctx.mode == ChatMode::Chat {
        return None;
    }

    match invocation {
        ChatToolInvocation::EditSection(args) => (!ctx.scope.allows_section(&args.section_id))
            .then(|| not_referenced("section", &args.section_id)),
        ChatToolInvocation::EditMetadata(args) => (!ctx.scope.allows_content(&args.content_id))
            .then(|| not_referenced("content", &args.content_id)),
        ChatToolInvocation::ContentWrite(args) => (!ctx.scope.allows_content(&args.content_id))
            .then(|| not_referenced("content", &args.content_id)),
        ChatToolInvocation::InsertImage(args) => {
            if !ctx.scope.allows_content(&args.content_id) {
                Some(not_referenced("content", &args.content_id))
            } else if !ctx.scope.allows_file(&args.file_id) {
                Some(not_referenced("file", &args.file_id))
            } else {
                None
            }
        }
        ChatToolInvocation::ReadContent(_)
        | ChatToolInvocation::ListSections(_)
        | ChatToolInvocation::SearchSources(_)
        | ChatToolInvocation::GenerateContent(_)
        | ChatToolInvocation::IngestSource(_) => None,
    }
}

/// Pre-dispatch check: the tool must be in `registry`, then pass
/// [`reference_scope_error`].
pub fn dispatch_error(
    registry: &ToolRegistry,
    invocation: &ChatToolInvocation,
    ctx: EnforcementContext<'_>,
) -> Option<String> {
    let name = invocation.name();
    if !registry.contains(name) {
        return Some(unregistered_tool_message(name));
    }
    reference_scope_error(invocation, ctx)
}
