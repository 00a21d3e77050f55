//! Completion provider port
//!
//! Defines the interface for streaming chat completions from an LLM provider.

use async_trait::async_trait;
use scribe_domain::{ChatMessage, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while opening or consuming a completion stream
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Stream closed before completion")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// A streaming completion request in provider-neutral form.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Tool definitions already converted to JSON Schema.
    pub tools: Vec<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.tools = tools;
        self
    }
}

/// Handle for receiving streaming events from a completion.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. A closed channel without a
/// terminal event reads as [`GatewayError::TransportClosed`].
pub struct ChunkStream {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl ChunkStream {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Build a stream that yields `events` in order. Used by adapters that
    /// have the whole response up front, and by tests.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // capacity covers every event
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Next event, or `TransportClosed` when the sender vanished mid-stream.
    pub async fn next_event(&mut self) -> StreamEvent {
        self.receiver
            .recv()
            .await
            .unwrap_or_else(|| StreamEvent::Error(GatewayError::TransportClosed.to_string()))
    }
}

/// Port for streaming chat completions
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streaming completion. Errors returned here mean the stream
    /// never started; failures after that arrive as `StreamEvent::Error`.
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<ChunkStream, GatewayError>;
}
