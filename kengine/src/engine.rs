//! The round-loop completion engine.
//!
//! One engine call drives rounds of model requests until the model stops
//! requesting tools or the round cap is hit. Blocking mode aggregates into a
//! [`CompletionOutcome`]; streaming mode produces a lazy event sequence that
//! ends with [`StreamEvent::Completed`]. Dropping the stream cancels the
//! call at the next suspension point.

use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::{Map, Value};

use kcommon::now_ms;
use kprovider::{
    ChunkItem, CompletionMessage, CompletionRequest, Message, ProviderClient, ToolCallRequest,
    resolve_model_options,
};
use ktooling::{
    ToolExecutionRecord, ToolExecutor, ToolInvocation, ToolOutcome, UnconfiguredToolExecutor,
    record_for_call,
};

use crate::{
    CompletionOutcome, EngineError, EngineRequest, ReasoningTrace, RoundPolicy, StreamEvent,
    StreamOutcome,
};

pub type EngineEventStream<'a> =
    Pin<Box<dyn Stream<Item = Result<StreamEvent, EngineError>> + Send + 'a>>;

pub struct CompletionEngine {
    provider: Arc<dyn ProviderClient>,
    executor: Arc<dyn ToolExecutor>,
    policy: RoundPolicy,
}

impl CompletionEngine {
    pub fn builder(provider: Arc<dyn ProviderClient>) -> CompletionEngineBuilder {
        CompletionEngineBuilder::new(provider)
    }

    /// Blocking mode: runs the round loop to completion and returns the
    /// aggregated result. Provider failures abort the call; tool failures
    /// are folded into the outcome and the loop continues.
    pub async fn execute_completion(
        &self,
        request: EngineRequest,
    ) -> Result<CompletionOutcome, EngineError> {
        let options = resolve_model_options(&request.model.config_entries);
        let mut messages = request.messages.clone();
        let mut records: Vec<ToolExecutionRecord> = Vec::new();
        let mut used_tools = BTreeSet::new();

        for round in 1..=self.policy.max_rounds {
            let completion_request = self.round_request(&request, &messages, &options, false)?;
            let completion = self.provider.complete(completion_request).await?;

            tracing::info!(
                phase = "engine",
                event = "round_complete",
                mode = "blocking",
                round,
                tool_calls = completion.tool_calls.len()
            );

            if !completion.has_tool_calls() {
                return Ok(CompletionOutcome {
                    response: completion,
                    tool_calls: records,
                    used_tools,
                    rounds: round,
                });
            }

            messages.push(completion.to_history_message());

            let outcomes = self
                .executor
                .execute_ordered(completion.tool_calls.clone(), &request.routes)
                .await;

            for outcome in outcomes {
                self.trace_outcome(&outcome, round);
                fold_outcome(outcome, &mut messages, &mut records, &mut used_tools);
            }
        }

        Err(self.loop_exceeded())
    }

    /// Streaming mode: a lazy event sequence over the same round loop.
    /// Content, reasoning, and tool lifecycle events are yielded as they
    /// occur; a well-formed sequence ends with exactly one
    /// [`StreamEvent::Completed`]. Errors end the sequence in place.
    pub fn stream_completion(&self, request: EngineRequest) -> EngineEventStream<'_> {
        let stream = try_stream! {
            let options = resolve_model_options(&request.model.config_entries);
            let mut messages = request.messages.clone();
            let mut records: Vec<ToolExecutionRecord> = Vec::new();
            let mut used_tools = BTreeSet::new();
            let mut full_response = String::new();
            let mut reasoning = ReasoningTrace::default();

            for round in 1..=self.policy.max_rounds {
                let completion_request =
                    self.round_request(&request, &messages, &options, true)?;
                let mut chunks = self.provider.stream(completion_request).await?;
                let mut finalized: Option<CompletionMessage> = None;

                while let Some(item) = chunks.next().await {
                    match item? {
                        ChunkItem::Chunk(chunk) => {
                            if let Some(text) = chunk.content {
                                full_response.push_str(&text);
                                yield StreamEvent::Chunk(text);
                            }

                            if let Some(text) = chunk.reasoning {
                                reasoning.observe(&text, now_ms());
                                yield StreamEvent::Reasoning(text);
                            }

                            for fragment in chunk.tool_call_fragments {
                                if let Some(name) = fragment.name {
                                    let probe = ToolCallRequest {
                                        id: fragment.id,
                                        name: name.clone(),
                                        arguments: String::new(),
                                    };
                                    yield StreamEvent::McpToolDetected(record_for_call(
                                        &probe,
                                        request.routes.get(&name),
                                    ));
                                }
                            }
                        }
                        ChunkItem::Completed(message) => finalized = Some(message),
                    }
                }

                let completion = finalized.ok_or_else(|| {
                    EngineError::provider("provider stream ended without a finalized message")
                })?;

                tracing::info!(
                    phase = "engine",
                    event = "round_complete",
                    mode = "streaming",
                    round,
                    tool_calls = completion.tool_calls.len()
                );

                if !completion.has_tool_calls() {
                    yield StreamEvent::Completed(StreamOutcome {
                        full_response,
                        final_completion: completion,
                        tool_calls: records,
                        used_tools,
                        reasoning,
                        rounds: round,
                    });
                    return;
                }

                messages.push(completion.to_history_message());

                for call in completion.tool_calls {
                    let route = request.routes.get(&call.name);
                    let outcome = match ToolInvocation::prepare(call, route) {
                        Ok(invocation) => {
                            yield StreamEvent::McpToolStart(invocation.record.clone());
                            self.executor.execute(invocation.begin()).await
                        }
                        Err(outcome) => *outcome,
                    };

                    self.trace_outcome(&outcome, round);

                    if outcome.succeeded() {
                        yield StreamEvent::McpToolResult(outcome.record.clone());
                    } else {
                        yield StreamEvent::McpToolError(outcome.record.clone());
                    }

                    fold_outcome(outcome, &mut messages, &mut records, &mut used_tools);
                }
            }

            let exceeded: Result<(), EngineError> = Err(self.loop_exceeded());
            exceeded?;
        };

        Box::pin(stream)
    }

    fn round_request(
        &self,
        request: &EngineRequest,
        messages: &[Message],
        options: &Map<String, Value>,
        stream: bool,
    ) -> Result<CompletionRequest, EngineError> {
        let completion_request = CompletionRequest::builder(request.model.model_name.clone())
            .messages(messages.to_vec())
            .options(options.clone())
            .tools(request.tools.clone())
            .streaming(stream)
            .build()?;

        Ok(completion_request)
    }

    fn trace_outcome(&self, outcome: &ToolOutcome, round: u32) {
        if outcome.succeeded() {
            tracing::info!(
                phase = "engine",
                event = "tool_success",
                round,
                tool = outcome.record.tool,
                tool_call_id = outcome.record.id,
                duration_ms = outcome.record.duration
            );
        } else {
            tracing::error!(
                phase = "engine",
                event = "tool_failure",
                round,
                tool = outcome.record.tool,
                tool_call_id = outcome.record.id,
                duration_ms = outcome.record.duration,
                error = outcome.record.error.as_deref()
            );
        }
    }

    fn loop_exceeded(&self) -> EngineError {
        EngineError::tool_loop_exceeded(format!(
            "model kept requesting tools after {} rounds",
            self.policy.max_rounds
        ))
    }
}

fn fold_outcome(
    outcome: ToolOutcome,
    messages: &mut Vec<Message>,
    records: &mut Vec<ToolExecutionRecord>,
    used_tools: &mut BTreeSet<String>,
) {
    if outcome.succeeded() {
        used_tools.insert(outcome.tool_name.clone());
    }

    messages.push(Message::tool(
        outcome.history_content(),
        outcome.record.id.clone(),
    ));
    records.push(outcome.record);
}

pub struct CompletionEngineBuilder {
    provider: Arc<dyn ProviderClient>,
    executor: Arc<dyn ToolExecutor>,
    policy: RoundPolicy,
}

impl CompletionEngineBuilder {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            provider,
            executor: Arc::new(UnconfiguredToolExecutor),
            policy: RoundPolicy::default(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_policy(mut self, policy: RoundPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<CompletionEngine, EngineError> {
        self.policy.validate()?;

        Ok(CompletionEngine {
            provider: self.provider,
            executor: self.executor,
            policy: self.policy,
        })
    }
}
