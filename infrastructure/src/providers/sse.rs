//! Server-sent events framing for streaming chat completions.
//!
//! Bytes arrive in arbitrary pieces: an event, a line, even a UTF-8
//! sequence may be split across network reads. [`SseDecoder`] buffers raw
//! bytes and only yields complete events (terminated by a blank line).

use scribe_domain::CompletionChunk;

/// One complete SSE event.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// Concatenated `data:` payload of the event.
    Data(String),
    /// The `[DONE]` sentinel.
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer
            .extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_event_end(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_event(&String::from_utf8_lossy(&event[..end])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing event the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            return None;
        }
        parse_event(&text)
    }
}

fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Comments (`:`), `event:` and `id:` lines are ignored; multiple `data:`
/// lines join with `\n`.
fn parse_event(event: &str) -> Option<SseFrame> {
    let mut data: Vec<&str> = Vec::new();
    for line in event.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return None;
    }
    let payload = data.join("\n");
    if payload.trim() == "[DONE]" {
        Some(SseFrame::Done)
    } else {
        Some(SseFrame::Data(payload))
    }
}

/// Decode a `data:` payload as a completion chunk.
pub fn parse_chunk(payload: &str) -> Result<CompletionChunk, serde_json::Error> {
    serde_json::from_str(payload)
}
