//! OpenAI-compatible streaming completions over HTTP.
//!
//! Works against any endpoint implementing `POST /chat/completions` with
//! `stream: true` (OpenAI, Azure OpenAI, Ollama, vLLM, LM Studio, ...).
//!
//! ```text
//! stream_completion()
//!   ├─ POST {base_url}/chat/completions   (bounded by request_timeout)
//!   ├─ non-2xx  → Err(GatewayError::RequestFailed)
//!   └─ 2xx      → spawn pump task ──▶ mpsc ──▶ ChunkStream
//!                   bytes → SseDecoder → CompletionChunk → StreamEvent
//! ```

use super::sse::{SseDecoder, SseFrame, parse_chunk};
use crate::config::FileProviderConfig;
use async_trait::async_trait;
use futures::StreamExt;
use scribe_application::ports::completion_provider::{
    ChunkStream, CompletionProvider, CompletionRequest, GatewayError,
};
use scribe_domain::{ChatMessage, Role, StreamEvent};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;
const ERROR_BODY_LIMIT: usize = 500;

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    request_timeout: Duration,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            request_timeout,
        })
    }

    /// Build from the `[provider]` config section, resolving the API key.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.base_url,
            config.resolve_api_key(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Wire form of one message. Assistant tool calls use the nested
/// `{"type": "function", "function": {...}}` shape.
fn message_json(message: &ChatMessage) -> Value {
    let mut value = json!({
        "role": message.role,
        "content": message.content,
    });
    if message.role == Role::Assistant && message.has_tool_calls() {
        value["tool_calls"] = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {"name": call.name, "arguments": call.arguments},
                })
            })
            .collect();
        if message.content.is_empty() {
            value["content"] = Value::Null;
        }
    }
    if let Some(id) = &message.tool_call_id {
        value["tool_call_id"] = json!(id);
    }
    value
}

pub(crate) fn request_body(request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "stream": true,
        "messages": request.messages.iter().map(message_json).collect::<Vec<_>>(),
    });
    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.clone());
        body["tool_choice"] = json!("auto");
    }
    body
}

fn map_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

/// Forward decoded events until `[DONE]`, an error, or the receiver goes away.
async fn pump(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut bytes = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut chunks = 0usize;

    loop {
        let frames = match bytes.next().await {
            Some(Ok(data)) => decoder.push(&data),
            Some(Err(e)) => {
                warn!("Completion stream read failed after {} chunk(s): {}", chunks, e);
                let _ = tx
                    .send(StreamEvent::Error(GatewayError::ConnectionError(e.to_string()).to_string()))
                    .await;
                return;
            }
            None => {
                // Body ended; honour a final unterminated event, else finish cleanly.
                let frames: Vec<SseFrame> = decoder.finish().into_iter().collect();
                if !forward(&tx, frames, &mut chunks).await {
                    return;
                }
                debug!("Completion stream closed without [DONE] after {} chunk(s)", chunks);
                let _ = tx.send(StreamEvent::Done).await;
                return;
            }
        };

        if !forward(&tx, frames, &mut chunks).await {
            return;
        }
    }
}

/// Send frames downstream. Returns false once the stream is over.
async fn forward(
    tx: &mpsc::Sender<StreamEvent>,
    frames: Vec<SseFrame>,
    chunks: &mut usize,
) -> bool {
    for frame in frames {
        let event = match frame {
            SseFrame::Done => {
                debug!("Completion stream done after {} chunk(s)", chunks);
                let _ = tx.send(StreamEvent::Done).await;
                return false;
            }
            SseFrame::Data(payload) => match parse_chunk(&payload) {
                Ok(chunk) => {
                    *chunks += 1;
                    StreamEvent::Chunk(chunk)
                }
                Err(e) => {
                    warn!("Unparseable completion chunk: {}", e);
                    let error = GatewayError::InvalidResponse(format!("{}: {}", e, payload));
                    let _ = tx.send(StreamEvent::Error(error.to_string())).await;
                    return false;
                }
            },
        };
        if tx.send(event).await.is_err() {
            debug!("Completion stream receiver dropped");
            return false;
        }
    }
    true
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<ChunkStream, GatewayError> {
        let body = request_body(&request);
        debug!(
            "POST {} (model {}, {} message(s), {} tool(s))",
            self.endpoint,
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = tokio::time::timeout(self.request_timeout, builder.send())
            .await
            .map_err(|_| GatewayError::Timeout)?
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(GatewayError::RequestFailed(format!("{}: {}", status, detail)));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(pump(response, tx));
        Ok(ChunkStream::new(rx))
    }
}
