//! Conversation messages and streamed completion output.

pub mod accumulator;
pub mod entities;
pub mod stream;

pub use accumulator::{
    AccumulatedResponse, MAX_TOOL_CALLS_PER_ROUND, StreamAccumulator, ToolCallIndexError,
};
pub use entities::{AssistantToolCall, ChatMessage, Role};
pub use stream::{ChoiceDelta, ChunkChoice, CompletionChunk, FunctionDelta, StreamEvent, ToolCallDelta};
