//! Application layer for scribe
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::OrchestrationParams;
pub use ports::{
    completion_provider::{ChunkStream, CompletionProvider, CompletionRequest, GatewayError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    reference_lookup::{LookupError, ReferenceLookupPort},
    tool_executor::{ToolExecutorPort, ToolProgress},
    tool_loop_observer::{NoToolLoopProgress, ToolLoopObserver},
    tool_schema::ToolSchemaPort,
};
pub use use_cases::resolve_references::{
    ResolveError, ResolveReferencesUseCase, describe_resolution,
};
pub use use_cases::run_tool_loop::{
    RunToolLoopInput, RunToolLoopUseCase, TerminationReason, ToolLoopOutput,
};
