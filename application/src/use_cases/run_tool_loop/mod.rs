//! Run Tool Loop use case
//!
//! Drives one chat turn: stream a completion, execute the tool calls it
//! contains, feed the results back, and repeat until the model answers
//! without tools or a bound is hit.
//!
//! ```text
//! RoundStart ──▶ Streaming ──┬─ no tool calls ──────────────▶ Done (Completed)
//!     ▲                      ├─ provider failure ───────────▶ Done (ProviderFailure)
//!     │                      └─ tool calls ──▶ Executing ──┬─ permanent failure ─▶ Done
//!     │                                                    │
//!     └──────────────── "Continue with the next step." ◀───┘
//!
//! after max_tool_iterations rounds ────────────────────────▶ Done (IterationLimit)
//! ```
//!
//! Per call, in emission order:
//!
//! | Step | Outcome |
//! |------|---------|
//! | parse fails | tool message with the parse error, call skipped |
//! | fingerprint failed `max_tool_retries` times | permanent failure, not executed |
//! | tool not registered, or mode or scope rejects | failure result, not executed |
//! | executor finishes in time | its result |
//! | executor outlives its timeout | "taking longer than expected" failure, task detached |

mod execution;
mod retry;
mod types;

pub use types::{RunToolLoopInput, TerminationReason, ToolLoopOutput};

use crate::config::OrchestrationParams;
use crate::ports::completion_provider::{CompletionProvider, CompletionRequest};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_loop_observer::{NoToolLoopProgress, ToolLoopObserver};
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::shared::{cancelled, is_cancelled};
use crate::use_cases::tool_helpers::{invocation_preview, tool_message_content};
use execution::execute_with_timeout;
use retry::TurnState;
use scribe_domain::{
    AccumulatedResponse, ChatMessage, ChatPromptTemplate, ChatToolInvocation, EnforcementContext,
    LoopMessages, StreamAccumulator, StreamEvent, ToolExecutionResult, ToolFingerprint,
    ToolHistoryEntry, ToolName, ToolRegistry, dispatch_error, tools_for_mode, truncate,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How one streamed round ended.
enum RoundStream {
    Complete(AccumulatedResponse),
    Failed { partial: String, error: String },
    Cancelled { partial: String },
}

pub struct RunToolLoopUseCase<P, E>
where
    P: CompletionProvider + ?Sized + 'static,
    E: ToolExecutorPort + ?Sized,
{
    pub(super) provider: Arc<P>,
    pub(super) executor: Arc<E>,
    pub(super) schema: Arc<dyn ToolSchemaPort>,
    pub(super) registry: ToolRegistry,
    pub(super) params: OrchestrationParams,
    pub(super) logger: Arc<dyn ConversationLogger>,
    pub(super) cancellation_token: Option<CancellationToken>,
}

impl<P, E> Clone for RunToolLoopUseCase<P, E>
where
    P: CompletionProvider + ?Sized + 'static,
    E: ToolExecutorPort + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            executor: self.executor.clone(),
            schema: self.schema.clone(),
            registry: self.registry.clone(),
            params: self.params.clone(),
            logger: self.logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<P, E> RunToolLoopUseCase<P, E>
where
    P: CompletionProvider + ?Sized + 'static,
    E: ToolExecutorPort + ?Sized,
{
    pub fn new(provider: Arc<P>, executor: Arc<E>, schema: Arc<dyn ToolSchemaPort>) -> Self {
        Self {
            provider,
            executor,
            schema,
            registry: ToolRegistry::standard(),
            params: OrchestrationParams::default(),
            logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: OrchestrationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Run one turn without progress reporting.
    pub async fn execute(&self, input: RunToolLoopInput) -> ToolLoopOutput {
        self.execute_with_progress(input, &NoToolLoopProgress).await
    }

    /// Run one turn, reporting progress to `observer`.
    pub async fn execute_with_progress(
        &self,
        input: RunToolLoopInput,
        observer: &dyn ToolLoopObserver,
    ) -> ToolLoopOutput {
        let mut state = TurnState::default();
        let tools = tools_for_mode(&self.registry, input.mode);
        let tool_schemas = self.schema.tools_schema(&tools);
        let system_prompt = ChatPromptTemplate::system(input.mode, &tools);
        let context = ChatPromptTemplate::context(&input.context_blocks);
        let max_rounds = self.params.max_tool_iterations;
        let max_retries = self.params.max_tool_retries;

        info!(
            "Starting {} turn: {} tool(s) offered, up to {} round(s)",
            input.mode,
            tools.len(),
            max_rounds
        );

        for round in 1..=max_rounds {
            if is_cancelled(&self.cancellation_token) {
                return self.finish(state, None, TerminationReason::Cancelled, round - 1, observer);
            }

            let messages = compose_messages(&system_prompt, context.as_deref(), &input, &state);
            self.logger.log(ConversationEvent::new(
                "llm_request",
                json!({
                    "round": round,
                    "mode": input.mode.as_str(),
                    "model": self.params.model,
                    "message_count": messages.len(),
                    "tool_count": tool_schemas.len(),
                }),
            ));
            let request = CompletionRequest::new(self.params.model.clone(), messages)
                .with_tools(tool_schemas.clone());

            let response = match self.stream_round(request, round, observer).await {
                RoundStream::Complete(response) => response,
                RoundStream::Failed { partial, error } => {
                    warn!("Provider failure in round {}: {}", round, error);
                    if !partial.is_empty() {
                        state.messages.push(ChatMessage::assistant(partial));
                    }
                    return self.finish(
                        state,
                        Some(LoopMessages::provider_failure()),
                        TerminationReason::ProviderFailure,
                        round,
                        observer,
                    );
                }
                RoundStream::Cancelled { partial } => {
                    if !partial.is_empty() {
                        state.messages.push(ChatMessage::assistant(partial));
                    }
                    return self.finish(state, None, TerminationReason::Cancelled, round, observer);
                }
            };

            self.logger.log(ConversationEvent::new(
                "llm_response",
                json!({
                    "round": round,
                    "content": response.content,
                    "tool_calls": response.tool_calls.iter().map(|c| json!({
                        "id": c.id,
                        "name": c.name,
                        "arguments": c.arguments,
                    })).collect::<Vec<_>>(),
                }),
            ));

            if response.tool_calls.is_empty() {
                let final_message =
                    (!response.content.trim().is_empty()).then(|| response.content.clone());
                if let Some(message) = &final_message {
                    state.messages.push(ChatMessage::assistant(message.clone()));
                }
                return self.finish(
                    state,
                    final_message,
                    TerminationReason::Completed,
                    round,
                    observer,
                );
            }

            debug!(
                "Round {}: {} tool call(s) requested",
                round,
                response.tool_calls.len()
            );
            state.messages.push(ChatMessage::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            let ctx = EnforcementContext::new(input.mode, &input.scope);
            let mut permanent_failures: Vec<ToolName> = Vec::new();

            for call in &response.tool_calls {
                let invocation = match ChatToolInvocation::parse(&call.name, &call.arguments) {
                    Ok(invocation) => invocation,
                    Err(e) => {
                        warn!("Skipping tool call {} ({}): {}", call.id, call.name, e);
                        let result = ToolExecutionResult::failure(format!("Invalid tool call: {}", e));
                        state
                            .messages
                            .push(ChatMessage::tool(&call.id, tool_message_content(&result)));
                        continue;
                    }
                };

                let fingerprint = ToolFingerprint::of(&invocation);
                let failures = state.ledger.failures(&fingerprint);
                let tool = invocation.name();

                if state.ledger.is_exhausted(&fingerprint, max_retries) {
                    warn!(
                        "{} failed {} time(s) with identical arguments; giving up on it",
                        tool, failures
                    );
                    permanent_failures.push(tool);
                    let result =
                        ToolExecutionResult::failure(LoopMessages::retry_exhausted(tool, failures));
                    state
                        .messages
                        .push(ChatMessage::tool(&call.id, tool_message_content(&result)));
                    continue;
                }

                if failures > 0 {
                    info!("Retrying {} (retry {}/{})", tool, failures, max_retries);
                    observer.on_retry(&invocation, failures);
                }

                let result = self.run_call(&invocation, &call.id, ctx, observer).await;
                let content = tool_message_content(&result);
                state.record_attempt(fingerprint, ToolHistoryEntry::new(invocation, result));
                state.messages.push(ChatMessage::tool(&call.id, content));
            }

            if !permanent_failures.is_empty() {
                return self.finish(
                    state,
                    Some(LoopMessages::permanent_failure(&permanent_failures)),
                    TerminationReason::PermanentToolFailure,
                    round,
                    observer,
                );
            }

            state
                .messages
                .push(ChatMessage::user(LoopMessages::CONTINUATION));
        }

        warn!("Reached {} round(s) without a final answer", max_rounds);
        self.finish(
            state,
            Some(LoopMessages::iteration_limit(max_rounds)),
            TerminationReason::IterationLimit,
            max_rounds,
            observer,
        )
    }

    async fn stream_round(
        &self,
        request: CompletionRequest,
        round: usize,
        observer: &dyn ToolLoopObserver,
    ) -> RoundStream {
        let mut stream = match self.provider.stream_completion(request).await {
            Ok(stream) => stream,
            Err(e) => {
                return RoundStream::Failed {
                    partial: String::new(),
                    error: e.to_string(),
                };
            }
        };

        let mut accumulator = StreamAccumulator::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = cancelled(&self.cancellation_token) => {
                    return RoundStream::Cancelled {
                        partial: accumulator.content().to_string(),
                    };
                }
                event = stream.next_event() => event,
            };

            match event {
                StreamEvent::Chunk(chunk) => match accumulator.push(&chunk) {
                    Ok(Some(text)) => observer.on_llm_chunk(&text),
                    Ok(None) => {}
                    Err(e) => {
                        return RoundStream::Failed {
                            partial: accumulator.content().to_string(),
                            error: e.to_string(),
                        };
                    }
                },
                StreamEvent::Error(error) => {
                    return RoundStream::Failed {
                        partial: accumulator.content().to_string(),
                        error,
                    };
                }
                StreamEvent::Done => break,
            }
        }

        debug!(
            "Round {} streamed {} chunk(s), {} byte(s) of text",
            round,
            accumulator.chunk_count(),
            accumulator.content().len()
        );
        RoundStream::Complete(accumulator.finish(round))
    }

    /// Authorize and execute one parsed call.
    async fn run_call(
        &self,
        invocation: &ChatToolInvocation,
        tool_call_id: &str,
        ctx: EnforcementContext<'_>,
        observer: &dyn ToolLoopObserver,
    ) -> ToolExecutionResult {
        let tool = invocation.name();
        self.logger.log(ConversationEvent::new(
            "tool_call",
            json!({
                "tool_call_id": tool_call_id,
                "tool": tool.as_str(),
                "arguments": invocation.arguments(),
            }),
        ));
        observer.on_tool_start(tool_call_id, invocation);

        let result = match dispatch_error(&self.registry, invocation, ctx) {
            Some(reason) => {
                warn!("Rejected {} ({}): {}", tool, tool_call_id, reason);
                ToolExecutionResult::failure(reason)
            }
            None => {
                let timeout = self.params.timeout_for(tool);
                info!(
                    "Executing {} ({}) with {}s timeout",
                    tool,
                    invocation_preview(invocation),
                    timeout.as_secs()
                );
                execute_with_timeout(
                    self.executor.clone(),
                    invocation.clone(),
                    tool_call_id,
                    timeout,
                    observer,
                )
                .await
            }
        };

        if result.success {
            info!("{} succeeded", tool);
        } else {
            info!("{} failed: {}", tool, truncate(result.error_message(), 200));
        }
        observer.on_tool_complete(tool_call_id, tool, &result);
        self.logger.log(ConversationEvent::new(
            "tool_result",
            json!({
                "tool_call_id": tool_call_id,
                "tool": tool.as_str(),
                "success": result.success,
                "error": result.error,
                "content_id": result.content_id,
                "source_content_id": result.source_content_id,
            }),
        ));
        result
    }

    fn finish(
        &self,
        state: TurnState,
        final_message: Option<String>,
        termination: TerminationReason,
        rounds: usize,
        observer: &dyn ToolLoopObserver,
    ) -> ToolLoopOutput {
        if let Some(message) = &final_message {
            observer.on_final_message(message);
        }
        info!(
            "Turn finished ({}) after {} round(s), {} tool execution(s)",
            termination,
            rounds,
            state.history.len()
        );
        self.logger.log(ConversationEvent::new(
            "turn_complete",
            json!({
                "termination": termination.as_str(),
                "rounds": rounds,
                "tool_executions": state.history.len(),
                "final_message": final_message,
            }),
        ));

        ToolLoopOutput {
            final_message,
            tool_history: state.history,
            messages: state.messages,
            termination,
            rounds,
            content_id: state.content_id,
            source_content_id: state.source_content_id,
        }
    }
}

/// System prompt, context, prior history, the user message, then this turn.
fn compose_messages(
    system_prompt: &str,
    context: Option<&str>,
    input: &RunToolLoopInput,
    state: &TurnState,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(input.history.len() + state.messages.len() + 3);
    messages.push(ChatMessage::system(system_prompt));
    if let Some(context) = context {
        messages.push(ChatMessage::system(context));
    }
    messages.extend(input.history.iter().cloned());
    messages.push(ChatMessage::user(input.user_message.clone()));
    messages.extend(state.messages.iter().cloned());
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::completion_provider::{ChunkStream, GatewayError};
    use crate::ports::tool_executor::ToolProgress;
    use async_trait::async_trait;
    use scribe_domain::{
        ChatMode, CompletionChunk, ReferenceScope, Role, TimeoutClass, ToolDefinition,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    // ==================== Mocks ====================

    /// Provider that plays back one scripted round per request.
    struct ScriptedProvider {
        rounds: Mutex<VecDeque<Result<Vec<StreamEvent>, GatewayError>>>,
        /// Played once the script is exhausted.
        fallback: Option<Vec<StreamEvent>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(rounds: Vec<Result<Vec<StreamEvent>, GatewayError>>) -> Self {
            Self {
                rounds: Mutex::new(rounds.into()),
                fallback: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn repeating(events: Vec<StreamEvent>) -> Self {
            Self {
                fallback: Some(events),
                ..Self::new(Vec::new())
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn stream_completion(
            &self,
            request: CompletionRequest,
        ) -> Result<ChunkStream, GatewayError> {
            self.requests.lock().unwrap().push(request);
            let next = self.rounds.lock().unwrap().pop_front();
            match next {
                Some(Ok(events)) => Ok(ChunkStream::from_events(events)),
                Some(Err(e)) => Err(e),
                None => match &self.fallback {
                    Some(events) => Ok(ChunkStream::from_events(events.clone())),
                    None => Ok(ChunkStream::from_events(text_round("(script exhausted)"))),
                },
            }
        }
    }

    /// Executor that returns scripted results and records every call.
    #[derive(Default)]
    struct ScriptedExecutor {
        results: Mutex<VecDeque<ToolExecutionResult>>,
        calls: Mutex<Vec<(String, ChatToolInvocation)>>,
        delay: Option<Duration>,
        progress_lines: Vec<&'static str>,
        panics: bool,
    }

    impl ScriptedExecutor {
        fn with_results(results: Vec<ToolExecutionResult>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for ScriptedExecutor {
        async fn execute(
            &self,
            invocation: ChatToolInvocation,
            tool_call_id: String,
            progress: ToolProgress,
        ) -> ToolExecutionResult {
            self.calls.lock().unwrap().push((tool_call_id, invocation));
            for line in &self.progress_lines {
                progress.report(*line);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panics {
                panic!("executor exploded");
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ToolExecutionResult::success(json!({"ok": true})))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ToolLoopObserver for RecordingObserver {
        fn on_llm_chunk(&self, chunk: &str) {
            self.events.lock().unwrap().push(format!("chunk:{}", chunk));
        }
        fn on_retry(&self, invocation: &ChatToolInvocation, retry_count: u32) {
            self.events
                .lock()
                .unwrap()
                .push(format!("retry:{}:{}", invocation.name(), retry_count));
        }
        fn on_tool_start(&self, tool_call_id: &str, invocation: &ChatToolInvocation) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}:{}", tool_call_id, invocation.name()));
        }
        fn on_tool_progress(&self, _tool_call_id: &str, _tool: ToolName, message: &str) {
            self.events.lock().unwrap().push(format!("progress:{}", message));
        }
        fn on_tool_complete(&self, tool_call_id: &str, _tool: ToolName, result: &ToolExecutionResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete:{}:{}", tool_call_id, result.success));
        }
        fn on_final_message(&self, message: &str) {
            self.events.lock().unwrap().push(format!("final:{}", message));
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    struct NameOnlySchema;

    impl ToolSchemaPort for NameOnlySchema {
        fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value {
            json!({"name": tool.name.as_str()})
        }
    }

    // ==================== Helpers ====================

    fn text_round(text: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::Chunk(CompletionChunk::text(text)),
            StreamEvent::Done,
        ]
    }

    /// One round emitting `calls` as `(id, name, arguments)`, arguments split in two chunks.
    fn tool_round(calls: &[(&str, &str, &str)]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for (index, &(id, name, arguments)) in calls.iter().enumerate() {
            let (head, tail) = arguments.split_at(arguments.len() / 2);
            events.push(StreamEvent::Chunk(CompletionChunk::tool_call(
                index,
                Some(id),
                Some(name),
                Some(head),
            )));
            events.push(StreamEvent::Chunk(CompletionChunk::tool_call(
                index,
                None,
                None,
                Some(tail),
            )));
        }
        events.push(StreamEvent::Done);
        events
    }

    fn scope_with_content(id: &str) -> ReferenceScope {
        let mut scope = ReferenceScope::new();
        scope.allowed_content_ids.insert(id.to_string());
        scope
    }

    fn use_case(
        provider: &Arc<ScriptedProvider>,
        executor: &Arc<ScriptedExecutor>,
    ) -> RunToolLoopUseCase<ScriptedProvider, ScriptedExecutor> {
        RunToolLoopUseCase::new(provider.clone(), executor.clone(), Arc::new(NameOnlySchema))
    }

    const EDIT_C1: &str = r#"{"contentId":"c1","title":"Better title"}"#;

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_no_tool_calls_returns_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_round("All done."))]));
        let executor = Arc::new(ScriptedExecutor::default());
        let observer = RecordingObserver::default();

        let output = use_case(&provider, &executor)
            .execute_with_progress(RunToolLoopInput::new("hi", ChatMode::Chat), &observer)
            .await;

        assert_eq!(output.final_message.as_deref(), Some("All done."));
        assert!(output.tool_history.is_empty());
        assert_eq!(output.termination, TerminationReason::Completed);
        assert_eq!(output.rounds, 1);
        assert_eq!(provider.request_count(), 1);
        assert_eq!(observer.events(), vec!["chunk:All done.", "final:All done."]);
    }

    #[tokio::test]
    async fn test_empty_content_gives_no_final_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![StreamEvent::Done])]));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("hi", ChatMode::Chat))
            .await;

        assert!(output.final_message.is_none());
        assert!(output.is_completed());
        assert!(output.messages.is_empty());
    }

    #[tokio::test]
    async fn test_request_composition_and_mode_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_round("ok"))]));
        let executor = Arc::new(ScriptedExecutor::default());
        let input = RunToolLoopInput::new("Summarize it", ChatMode::Chat)
            .with_history(vec![ChatMessage::user("earlier"), ChatMessage::assistant("reply")])
            .with_context_block("Referenced: launch-post");

        use_case(&provider, &executor).execute(input).await;

        let requests = provider.requests.lock().unwrap();
        let messages = &requests[0].messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert!(messages[1].content.contains("Referenced: launch-post"));
        assert_eq!(messages[4].content, "Summarize it");

        let offered: Vec<&str> = requests[0]
            .tools
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert!(offered.contains(&"read_content"));
        assert!(!offered.contains(&"edit_metadata"));
    }

    #[tokio::test]
    async fn test_tool_round_then_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("call_1", "read_content", r#"{"contentId":"c1"}"#)])),
            Ok(text_round("Here is the summary.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::default());
        let logger = Arc::new(RecordingLogger::default());

        let output = use_case(&provider, &executor)
            .with_conversation_logger(logger.clone())
            .execute(RunToolLoopInput::new("summarize @c1", ChatMode::Chat))
            .await;

        assert_eq!(output.final_message.as_deref(), Some("Here is the summary."));
        assert_eq!(output.rounds, 2);
        assert_eq!(output.tool_history.len(), 1);
        assert_eq!(output.tool_history[0].tool_name, ToolName::ReadContent);
        assert_eq!(executor.calls.lock().unwrap()[0].0, "call_1");

        // assistant(tool_calls) -> tool -> continuation -> final assistant
        let roles: Vec<Role> = output.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::Tool, Role::User, Role::Assistant]);
        assert_eq!(output.messages[0].tool_calls[0].arguments, r#"{"contentId":"c1"}"#);
        assert_eq!(output.messages[1].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(output.messages[2].content, LoopMessages::CONTINUATION);

        // second request replays this turn's messages after the user message
        let requests = provider.requests.lock().unwrap();
        let second = &requests[1].messages;
        assert_eq!(second.len(), 2 + 3);
        assert_eq!(second[2].role, Role::Assistant);

        let events = logger.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "llm_request",
                "llm_response",
                "tool_call",
                "tool_result",
                "llm_request",
                "llm_response",
                "turn_complete"
            ]
        );
    }

    #[tokio::test]
    async fn test_identical_failures_become_permanent() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("a1", "edit_metadata", EDIT_C1)])),
            Ok(tool_round(&[("a2", "edit_metadata", EDIT_C1)])),
            Ok(tool_round(&[
                ("a3", "edit_metadata", EDIT_C1),
                ("a4", "edit_metadata", r#"{"contentId":"c1","title":"Other"}"#),
            ])),
        ]));
        let executor = Arc::new(ScriptedExecutor::with_results(vec![
            ToolExecutionResult::failure("database locked"),
            ToolExecutionResult::failure("database locked"),
        ]));
        let observer = RecordingObserver::default();
        let input = RunToolLoopInput::new("retitle @c1", ChatMode::Agent)
            .with_scope(scope_with_content("c1"));

        let output = use_case(&provider, &executor)
            .execute_with_progress(input, &observer)
            .await;

        assert_eq!(output.termination, TerminationReason::PermanentToolFailure);
        assert_eq!(output.rounds, 3);
        let final_message = output.final_message.unwrap();
        assert!(final_message.contains("edit_metadata"));

        // the third identical call is never executed; the different one is
        let ids: Vec<String> = executor.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a4"]);
        assert_eq!(output.tool_history.len(), 3);
        assert!(output.tool_history[2].result.success);

        // every call id is still answered
        let answered: Vec<&str> = output
            .messages
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(answered, vec!["a1", "a2", "a3", "a4"]);

        assert!(observer.events().contains(&"retry:edit_metadata:1".to_string()));
    }

    #[tokio::test]
    async fn test_success_after_retry_clears_counter() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("a1", "edit_metadata", EDIT_C1)])),
            Ok(tool_round(&[("a2", "edit_metadata", EDIT_C1)])),
            Ok(tool_round(&[("a3", "edit_metadata", EDIT_C1)])),
            Ok(tool_round(&[("a4", "edit_metadata", EDIT_C1)])),
            Ok(text_round("Done.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::with_results(vec![
            ToolExecutionResult::failure("flaky"),
            ToolExecutionResult::success("ok"),
            ToolExecutionResult::failure("flaky"),
            ToolExecutionResult::failure("flaky"),
        ]));
        let input = RunToolLoopInput::new("retitle @c1", ChatMode::Agent)
            .with_scope(scope_with_content("c1"));

        let output = use_case(&provider, &executor).execute(input).await;

        assert_eq!(executor.call_count(), 4);
        assert_eq!(output.termination, TerminationReason::Completed);
        assert_eq!(output.final_message.as_deref(), Some("Done."));
    }

    #[tokio::test]
    async fn test_chat_mode_rejects_write_before_execution() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("w1", "edit_metadata", EDIT_C1)])),
            Ok(text_round("I can't change that in chat mode.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::default());
        let input =
            RunToolLoopInput::new("retitle @c1", ChatMode::Chat).with_scope(scope_with_content("c1"));

        let output = use_case(&provider, &executor).execute(input).await;

        assert_eq!(executor.call_count(), 0);
        assert_eq!(output.tool_history.len(), 1);
        let result = &output.tool_history[0].result;
        assert!(!result.success);
        assert!(result.error_message().contains("chat mode"));
        assert!(output.messages[1].content.contains("chat mode"));
        assert!(output.is_completed());
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_not_dispatched() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("w1", "edit_metadata", EDIT_C1)])),
            Ok(text_round("That tool isn't available.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::default());
        let registry = ToolRegistry::new()
            .register(ToolDefinition::new(ToolName::ReadContent, "Read a content item"));
        let input = RunToolLoopInput::new("retitle @c1", ChatMode::Agent)
            .with_scope(scope_with_content("c1"));

        let output = use_case(&provider, &executor)
            .with_registry(registry)
            .execute(input)
            .await;

        let requests = provider.requests.lock().unwrap();
        let offered: Vec<&str> = requests[0]
            .tools
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(offered, vec!["read_content"]);

        assert_eq!(executor.call_count(), 0);
        assert_eq!(output.tool_history.len(), 1);
        assert!(!output.tool_history[0].result.success);
        assert!(output.messages[1].content.contains("isn't available"));
        assert!(output.is_completed());
    }

    #[tokio::test]
    async fn test_oversized_tool_call_index_is_provider_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
            StreamEvent::Chunk(CompletionChunk::text("Let me")),
            StreamEvent::Chunk(CompletionChunk::tool_call(
                1 << 40,
                Some("huge"),
                Some("read_content"),
                Some("{}"),
            )),
            StreamEvent::Done,
        ])]));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("hi", ChatMode::Chat))
            .await;

        assert_eq!(output.termination, TerminationReason::ProviderFailure);
        assert_eq!(output.final_message, Some(LoopMessages::provider_failure()));
        assert_eq!(executor.call_count(), 0);
        assert_eq!(output.messages.len(), 1);
        assert_eq!(output.messages[0].content, "Let me");
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_agent_mode_rejects_unmentioned_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("w1", "edit_metadata", r#"{"contentId":"c2","title":"x"}"#)])),
            Ok(text_round("Please mention it first.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::default());
        let input =
            RunToolLoopInput::new("retitle", ChatMode::Agent).with_scope(scope_with_content("c1"));

        let output = use_case(&provider, &executor).execute(input).await;

        assert_eq!(executor.call_count(), 0);
        assert!(output.tool_history[0].result.error_message().contains("wasn't referenced"));
    }

    #[tokio::test]
    async fn test_malformed_calls_are_skipped() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[
                ("bad_json", "read_content", r#"{"contentId":"#),
                ("bad_name", "drop_everything", "{}"),
                ("good", "read_content", r#"{"contentId":"c1"}"#),
            ])),
            Ok(text_round("ok")),
        ]));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("read", ChatMode::Chat))
            .await;

        assert_eq!(executor.call_count(), 1);
        assert_eq!(output.tool_history.len(), 1);
        let answered: Vec<&str> = output
            .messages
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(answered, vec!["bad_json", "bad_name", "good"]);
        assert!(output.messages[2].content.contains("unknown tool"));
        assert!(output.is_completed());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_ends_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
            StreamEvent::Chunk(CompletionChunk::text("Working on")),
            StreamEvent::Error("connection reset".to_string()),
        ])]));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("hi", ChatMode::Chat))
            .await;

        assert_eq!(output.termination, TerminationReason::ProviderFailure);
        assert_eq!(output.final_message, Some(LoopMessages::provider_failure()));
        assert_eq!(output.messages.len(), 1);
        assert_eq!(output.messages[0].content, "Working on");
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(GatewayError::RequestFailed(
            "503".to_string(),
        ))]));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("hi", ChatMode::Chat))
            .await;

        assert_eq!(output.termination, TerminationReason::ProviderFailure);
        assert!(output.messages.is_empty());
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_always_tool_model_hits_iteration_limit() {
        let provider = Arc::new(ScriptedProvider::repeating(tool_round(&[(
            "r",
            "read_content",
            r#"{"contentId":"c1"}"#,
        )])));
        let executor = Arc::new(ScriptedExecutor::default());

        let output = use_case(&provider, &executor)
            .with_params(OrchestrationParams::default().with_max_tool_iterations(3))
            .execute(RunToolLoopInput::new("loop", ChatMode::Chat))
            .await;

        assert_eq!(output.termination, TerminationReason::IterationLimit);
        assert_eq!(output.rounds, 3);
        assert_eq!(provider.request_count(), 3);
        assert_eq!(executor.call_count(), 3);
        assert!(output.final_message.unwrap().contains("maximum number of tool calls"));
    }

    #[tokio::test]
    async fn test_always_failing_model_stops_within_bound() {
        let provider = Arc::new(ScriptedProvider::repeating(tool_round(&[(
            "r",
            "read_content",
            r#"{"contentId":"c1"}"#,
        )])));
        let executor = Arc::new(ScriptedExecutor::with_results(
            (0..10).map(|_| ToolExecutionResult::failure("gone")).collect(),
        ));

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("loop", ChatMode::Chat))
            .await;

        // 2 executions, the 3rd identical attempt is routed to permanent failure
        assert_eq!(executor.call_count(), 2);
        assert_eq!(output.rounds, 3);
        assert_eq!(output.termination, TerminationReason::PermanentToolFailure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces_as_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[(
                "g1",
                "generate_content",
                r#"{"sourceId":"src-1","format":"blog"}"#,
            )])),
            Ok(text_round("It's still generating.")),
        ]));
        let executor = Arc::new(ScriptedExecutor {
            delay: Some(Duration::from_secs(1_000)),
            ..Default::default()
        });
        let started = tokio::time::Instant::now();

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("draft @source:src-1", ChatMode::Agent))
            .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(300));
        assert!(elapsed < Duration::from_secs(1_000));
        let result = &output.tool_history[0].result;
        assert!(!result.success);
        assert!(result.error_message().contains("taking longer than expected"));
        assert!(output.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_configured_class_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("i1", "ingest_source", r#"{"url":"https://v.test/1"}"#)])),
            Ok(text_round("ok")),
        ]));
        let executor = Arc::new(ScriptedExecutor {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let params = OrchestrationParams::default()
            .with_timeout(TimeoutClass::Ingestion, Duration::from_secs(10));

        let output = use_case(&provider, &executor)
            .with_params(params)
            .execute(RunToolLoopInput::new("ingest", ChatMode::Agent))
            .await;

        assert!(!output.tool_history[0].result.success);
    }

    #[tokio::test]
    async fn test_progress_is_forwarded() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("i1", "ingest_source", r#"{"url":"https://v.test/1"}"#)])),
            Ok(text_round("ok")),
        ]));
        let executor = Arc::new(ScriptedExecutor {
            progress_lines: vec!["downloading", "transcribing"],
            ..Default::default()
        });
        let observer = RecordingObserver::default();

        use_case(&provider, &executor)
            .execute_with_progress(RunToolLoopInput::new("ingest", ChatMode::Agent), &observer)
            .await;

        let events = observer.events();
        let start = events.iter().position(|e| e == "start:i1:ingest_source").unwrap();
        let complete = events.iter().position(|e| e == "complete:i1:true").unwrap();
        let first = events.iter().position(|e| e == "progress:downloading").unwrap();
        let second = events.iter().position(|e| e == "progress:transcribing").unwrap();
        assert!(start < first && first < second && second < complete);
    }

    #[tokio::test]
    async fn test_panicking_executor_becomes_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[("r1", "read_content", r#"{"contentId":"c1"}"#)])),
            Ok(text_round("ok")),
        ]));
        let executor = Arc::new(ScriptedExecutor {
            panics: true,
            ..Default::default()
        });

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("read", ChatMode::Chat))
            .await;

        assert!(!output.tool_history[0].result.success);
        assert!(output.is_completed());
    }

    #[tokio::test]
    async fn test_latest_correlation_ids_reported() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_round(&[(
                "g1",
                "generate_content",
                r#"{"sourceId":"src-1","format":"blog"}"#,
            )])),
            Ok(text_round("Drafted.")),
        ]));
        let executor = Arc::new(ScriptedExecutor::with_results(vec![
            ToolExecutionResult::success(json!({"status": "drafted"}))
                .with_content_id("c-new")
                .with_source_content_id("c-new"),
        ]));

        let output = use_case(&provider, &executor)
            .execute(RunToolLoopInput::new("draft", ChatMode::Agent))
            .await;

        assert_eq!(output.content_id.as_deref(), Some("c-new"));
        assert_eq!(output.source_content_id.as_deref(), Some("c-new"));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_round() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_round("never"))]));
        let executor = Arc::new(ScriptedExecutor::default());
        let token = CancellationToken::new();
        token.cancel();

        let output = use_case(&provider, &executor)
            .with_cancellation(token)
            .execute(RunToolLoopInput::new("hi", ChatMode::Chat))
            .await;

        assert_eq!(output.termination, TerminationReason::Cancelled);
        assert_eq!(output.rounds, 0);
        assert_eq!(provider.request_count(), 0);
    }
}
