//! Domain layer for scribe
//!
//! This crate contains the pure logic of the tool-orchestration engine.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Mentions and Scope
//!
//! Users point at workspace entities with `@mentions`. Each mention resolves
//! to a file, content item, section or source, and the resolved set becomes
//! the [`ReferenceScope`]: the only entities a mutating tool may touch during
//! that turn.
//!
//! ## Tools and Modes
//!
//! - **Chat** (default): read tools only
//! - **Agent**: all tools, mutations gated by the scope

pub mod core;
pub mod prompt;
pub mod reference;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use core::{error::DomainError, string::truncate};
pub use prompt::{ChatPromptTemplate, LoopMessages};
pub use reference::{
    AmbiguousReference, AnchorKind, BestMatch, ContentRecord, FileRecord, LookupQuery, MatchTier,
    ReferenceAnchor, ReferenceCandidate, ReferenceKind, ReferenceScope, ReferenceToken,
    ResolutionOutcome, ResolvedReference, SectionRecord, SourceRecord, UnresolvedReason,
    UnresolvedReference, build_scope, normalize_key, parse_references, select_best_match,
};
pub use session::{
    AccumulatedResponse, AssistantToolCall, ChatMessage, CompletionChunk, MAX_TOOL_CALLS_PER_ROUND,
    Role, StreamAccumulator, StreamEvent, ToolCallIndexError,
};
pub use tool::{
    ChatMode, ChatToolInvocation, EnforcementContext, InvocationParseError, TimeoutClass,
    ToolDefinition, ToolExecutionResult, ToolFingerprint, ToolHistoryEntry, ToolKind, ToolName,
    ToolParameter, ToolRegistry, UnknownToolError, dispatch_error, is_tool_allowed_in_mode,
    reference_scope_error, tools_for_mode,
};
