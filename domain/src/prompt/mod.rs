//! Prompt domain
//!
//! System prompts per chat mode and the fixed user-facing messages the tool
//! loop emits when a turn ends without a natural model reply.

mod chat;
mod messages;

pub use chat::ChatPromptTemplate;
pub use messages::LoopMessages;
