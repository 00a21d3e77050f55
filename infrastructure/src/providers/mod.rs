//! Completion provider adapters.
//!
//! [`OpenAiCompatibleProvider`] streams chat completions from any endpoint
//! speaking the OpenAI wire format; [`sse`] holds the event framing it uses.

mod openai_compatible;
pub mod sse;

pub use openai_compatible::OpenAiCompatibleProvider;
