//! Reassembly of streamed completion output.

use super::entities::AssistantToolCall;
use super::stream::CompletionChunk;
use thiserror::Error;

/// Highest number of tool call slots one streamed round may open.
pub const MAX_TOOL_CALLS_PER_ROUND: usize = 64;

/// A tool call delta addressed a slot past [`MAX_TOOL_CALLS_PER_ROUND`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool call index {index} exceeds the per-round limit of {limit}")]
pub struct ToolCallIndexError {
    pub index: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Collects text and tool call deltas for one completion round.
///
/// Tool call slots are keyed by the delta `index`. The first delta seen for
/// an index seeds its id and name; every delta appends its argument fragment.
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    content: String,
    tool_calls: Vec<PartialToolCall>,
    chunks: usize,
}

/// Completed round output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResponse {
    pub content: String,
    pub tool_calls: Vec<AssistantToolCall>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in and return its text delta, if any.
    ///
    /// Fails when a delta's `index` is at or past
    /// [`MAX_TOOL_CALLS_PER_ROUND`]; the round output is then unusable.
    pub fn push(&mut self, chunk: &CompletionChunk) -> Result<Option<String>, ToolCallIndexError> {
        self.chunks += 1;
        let mut text: Option<String> = None;

        for choice in &chunk.choices {
            if let Some(content) = choice.delta.content.as_deref().filter(|c| !c.is_empty()) {
                self.content.push_str(content);
                text.get_or_insert_with(String::new).push_str(content);
            }

            for delta in choice.delta.tool_calls.iter().flatten() {
                if delta.index >= MAX_TOOL_CALLS_PER_ROUND {
                    return Err(ToolCallIndexError {
                        index: delta.index,
                        limit: MAX_TOOL_CALLS_PER_ROUND,
                    });
                }
                if self.tool_calls.len() <= delta.index {
                    self.tool_calls
                        .resize_with(delta.index + 1, PartialToolCall::default);
                }
                let slot = &mut self.tool_calls[delta.index];
                if slot.id.is_none() {
                    slot.id = delta.id.clone().filter(|id| !id.is_empty());
                }
                if slot.name.is_none() {
                    slot.name = delta.function.name.clone().filter(|n| !n.is_empty());
                }
                if let Some(arguments) = &delta.function.arguments {
                    slot.arguments.push_str(arguments);
                }
            }
        }

        Ok(text)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Finish the round. Slots that never received a name are dropped;
    /// missing ids become `call_{round}_{index}`.
    pub fn finish(self, round: usize) -> AccumulatedResponse {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .enumerate()
            .filter_map(|(index, partial)| {
                let name = partial.name?;
                let id = partial
                    .id
                    .unwrap_or_else(|| format!("call_{}_{}", round, index));
                Some(AssistantToolCall::new(id, name, partial.arguments))
            })
            .collect();

        AccumulatedResponse {
            content: self.content,
            tool_calls,
        }
    }
}
