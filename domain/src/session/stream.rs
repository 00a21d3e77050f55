//! Streaming completion chunks.
//!
//! [`CompletionChunk`] mirrors the OpenAI chat-completions streaming shape.
//! Providers translate their wire format into these chunks and push them
//! through a channel as [`StreamEvent`]s.

use serde::{Deserialize, Serialize};

/// One chunk of a streaming completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: ChoiceDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Incremental tool call data.
///
/// Tool calls arrive in pieces: the first delta for an `index` carries `id`
/// and `name`, later ones carry argument fragments to be concatenated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub function: FunctionDelta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl CompletionChunk {
    /// Chunk carrying only a text delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChoiceDelta {
                    content: Some(content.into()),
                    tool_calls: None,
                },
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Chunk carrying a single tool call delta.
    pub fn tool_call(
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChoiceDelta {
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index,
                        id: id.map(str::to_string),
                        function: FunctionDelta {
                            name: name.map(str::to_string),
                            arguments: arguments.map(str::to_string),
                        },
                    }]),
                },
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

/// An event on a completion stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(CompletionChunk),
    /// Transport or provider failure; terminal.
    Error(String),
    /// Normal end of stream.
    Done,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error(_) | StreamEvent::Done)
    }
}
