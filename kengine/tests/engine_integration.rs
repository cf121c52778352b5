use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use serde_json::json;

use kengine::prelude::*;
use kprovider::{
    BoxedChunkStream, ChunkItem, CompletionMessage, CompletionRequest, Message, ModelDescriptor,
    ModelOptionEntry, ProviderClient, ProviderError, ProviderFuture, StreamChunk, ToolCallFragment,
    ToolCallRequest, ToolDefinition, VecChunkStream,
};

enum RoundScript {
    Complete(CompletionMessage),
    Stream(Vec<Result<ChunkItem, ProviderError>>),
}

/// Plays back one scripted response per round and captures every request the
/// engine sends, so tests can assert on history growth and request shape.
struct ScriptedProvider {
    script: Mutex<VecDeque<RoundScript>>,
    captured: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<RoundScript>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            captured: Mutex::new(Vec::new()),
        }
    }

    fn captured(&self) -> Vec<CompletionRequest> {
        self.captured.lock().unwrap().clone()
    }

    fn next_round(&self, request: CompletionRequest) -> Result<RoundScript, ProviderError> {
        self.captured.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::unavailable("script exhausted"))
    }
}

impl ProviderClient for ScriptedProvider {
    fn key(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<CompletionMessage, ProviderError>> {
        Box::pin(async move {
            match self.next_round(request)? {
                RoundScript::Complete(message) => Ok(message),
                RoundScript::Stream(_) => {
                    Err(ProviderError::invalid_request("expected a blocking round"))
                }
            }
        })
    }

    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            match self.next_round(request)? {
                RoundScript::Stream(items) => {
                    Ok(Box::pin(VecChunkStream::new(items)) as BoxedChunkStream<'a>)
                }
                RoundScript::Complete(_) => {
                    Err(ProviderError::invalid_request("expected a streaming round"))
                }
            }
        })
    }
}

fn search_call(id: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: "search".to_string(),
        arguments: arguments.to_string(),
    }
}

fn search_definition() -> ToolDefinition {
    ToolDefinition {
        name: "search".to_string(),
        description: "Searches the web".to_string(),
        parameters: json!({"type": "object"}),
    }
}

fn search_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_sync_fn(search_definition(), |_input| Ok(json!({"answer": "sunny"})));
    registry.register_sync_fn(
        ToolDefinition {
            name: "broken".to_string(),
            description: "Always fails".to_string(),
            parameters: json!({"type": "object"}),
        },
        |_input| Err(ToolError::execution("tool exploded")),
    );
    Arc::new(registry)
}

fn engine_with(
    provider: Arc<ScriptedProvider>,
    policy: RoundPolicy,
) -> kengine::CompletionEngine {
    kengine::CompletionEngine::builder(provider)
        .with_executor(Arc::new(RegistryToolExecutor::new(search_registry())))
        .with_policy(policy)
        .build()
        .expect("engine should build")
}

fn tool_request(model: ModelDescriptor) -> EngineRequest {
    EngineRequest::builder(model)
        .message(Message::user("what is the weather"))
        .tool(search_definition())
        .route("search", ToolRoute::new("web", "search"))
        .build()
        .expect("request should build")
}

async fn collect(
    mut stream: kengine::EngineEventStream<'_>,
) -> (Vec<StreamEvent>, Option<EngineError>) {
    let mut events = Vec::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => events.push(event),
            Err(error) => return (events, Some(error)),
        }
    }

    (events, None)
}

#[tokio::test]
async fn blocking_no_tool_calls_completes_in_one_round() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Complete(
        CompletionMessage::text("hello"),
    )]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let outcome = engine
        .execute_completion(request)
        .await
        .expect("completion should succeed");

    assert_eq!(outcome.response.content, "hello");
    assert!(outcome.used_tools.is_empty());
    assert!(outcome.tool_calls.is_empty());
    assert_eq!(outcome.rounds, 1);

    let captured = provider.captured();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].tools.is_empty());
    assert!(captured[0].tool_choice.is_none());
}

#[tokio::test]
async fn blocking_tool_round_folds_results_and_tracks_usage() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        RoundScript::Complete(
            CompletionMessage::text("checking")
                .with_tool_calls(vec![search_call("call_1", "{\"q\":\"weather\"}")]),
        ),
        RoundScript::Complete(CompletionMessage::text("done")),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let outcome = engine
        .execute_completion(tool_request(ModelDescriptor::new("gpt-4o-mini", "scripted")))
        .await
        .expect("completion should succeed");

    assert_eq!(outcome.response.content, "done");
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.used_tools.iter().collect::<Vec<_>>(), ["search"]);
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].mcp_server, "web");
    assert!(outcome.tool_calls[0].is_success());
    assert_eq!(outcome.tool_calls[0].input, Some(json!({"q": "weather"})));

    // Round 2 sees the assistant turn plus one tool message, in call order.
    let captured = provider.captured();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[1].messages.len(), captured[0].messages.len() + 2);

    let assistant = &captured[1].messages[1];
    assert_eq!(assistant.tool_calls.len(), 1);

    let tool_message = &captured[1].messages[2];
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.content, "{\"answer\":\"sunny\"}");
}

#[tokio::test]
async fn blocking_tool_failure_is_recorded_but_does_not_abort() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        RoundScript::Complete(CompletionMessage::text("").with_tool_calls(vec![
            ToolCallRequest {
                id: "call_1".to_string(),
                name: "broken".to_string(),
                arguments: "{}".to_string(),
            },
        ])),
        RoundScript::Complete(CompletionMessage::text("recovered")),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("go"))
        .build()
        .expect("request should build");

    let outcome = engine
        .execute_completion(request)
        .await
        .expect("completion should succeed");

    assert_eq!(outcome.response.content, "recovered");
    assert!(outcome.used_tools.is_empty());
    assert_eq!(outcome.tool_calls.len(), 1);
    assert!(!outcome.tool_calls[0].is_success());

    // The failure still reaches the model as a tool message.
    let captured = provider.captured();
    let tool_message = &captured[1].messages[2];
    assert!(tool_message.content.contains("tool exploded"));
}

#[tokio::test]
async fn blocking_round_cap_fails_with_tool_loop_exceeded() {
    let looping_round = || {
        RoundScript::Complete(
            CompletionMessage::text("").with_tool_calls(vec![search_call("call_n", "{}")]),
        )
    };
    let provider = Arc::new(ScriptedProvider::new(vec![
        looping_round(),
        looping_round(),
        looping_round(),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::with_max_rounds(2));

    let error = engine
        .execute_completion(tool_request(ModelDescriptor::new("gpt-4o-mini", "scripted")))
        .await
        .expect_err("completion should fail");

    assert_eq!(error.kind, EngineErrorKind::ToolLoopExceeded);
    assert_eq!(provider.captured().len(), 2);
}

#[tokio::test]
async fn model_option_entries_merge_into_every_request() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Complete(
        CompletionMessage::text("ok"),
    )]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let model = ModelDescriptor::new("gpt-4o-mini", "scripted").with_config_entries(vec![
        ModelOptionEntry::new("t", json!(0.5)),
        ModelOptionEntry::new("\"t\"", json!(0.9)),
        ModelOptionEntry::disabled("max_tokens", json!(64)),
    ]);
    let request = EngineRequest::builder(model)
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    engine
        .execute_completion(request)
        .await
        .expect("completion should succeed");

    let captured = provider.captured();
    assert_eq!(captured[0].options.len(), 1);
    assert_eq!(captured[0].options.get("t"), Some(&json!(0.9)));
}

#[tokio::test]
async fn streaming_chunks_concatenate_into_full_response() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Stream(vec![
        Ok(ChunkItem::Chunk(StreamChunk::content("Hel"))),
        Ok(ChunkItem::Chunk(StreamChunk::content("lo"))),
        Ok(ChunkItem::Completed(CompletionMessage::text("Hello"))),
    ])]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let (events, error) = collect(engine.stream_completion(request)).await;
    assert!(error.is_none());

    let mut concatenated = String::new();
    let mut outcome = None;
    for event in &events {
        match event {
            StreamEvent::Chunk(text) => concatenated.push_str(text),
            StreamEvent::Completed(completed) => outcome = Some(completed.clone()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    let outcome = outcome.expect("stream should complete");
    assert_eq!(concatenated, "Hello");
    assert_eq!(outcome.full_response, "Hello");
    assert_eq!(outcome.final_completion.content, "Hello");
    assert_eq!(outcome.rounds, 1);
    assert!(outcome.used_tools.is_empty());
    assert!(provider.captured()[0].stream);
}

#[tokio::test]
async fn streaming_reasoning_tracks_timing_and_text() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Stream(vec![
        Ok(ChunkItem::Chunk(StreamChunk::reasoning("think"))),
        Ok(ChunkItem::Chunk(StreamChunk::reasoning("ing"))),
        Ok(ChunkItem::Chunk(StreamChunk::content("answer"))),
        Ok(ChunkItem::Completed(CompletionMessage::text("answer"))),
    ])]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let (events, error) = collect(engine.stream_completion(request)).await;
    assert!(error.is_none());

    let reasoning_events = events
        .iter()
        .filter(|event| matches!(event, StreamEvent::Reasoning(_)))
        .count();
    assert_eq!(reasoning_events, 2);

    let Some(StreamEvent::Completed(outcome)) = events.last() else {
        panic!("stream should end with the aggregated outcome");
    };
    assert_eq!(outcome.reasoning.content, "thinking");
    let started = outcome.reasoning.started_at.expect("start should be set");
    let ended = outcome.reasoning.ended_at.expect("end should be set");
    assert!(started <= ended);
}

#[tokio::test]
async fn streaming_tool_lifecycle_events_arrive_in_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        RoundScript::Stream(vec![
            Ok(ChunkItem::Chunk(StreamChunk::tool_fragment(
                ToolCallFragment {
                    id: "call_1".to_string(),
                    name: Some("search".to_string()),
                    arguments: None,
                },
            ))),
            Ok(ChunkItem::Completed(
                CompletionMessage::text("")
                    .with_tool_calls(vec![search_call("call_1", "{\"q\":\"weather\"}")]),
            )),
        ]),
        RoundScript::Stream(vec![
            Ok(ChunkItem::Chunk(StreamChunk::content("done"))),
            Ok(ChunkItem::Completed(CompletionMessage::text("done"))),
        ]),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let (events, error) =
        collect(engine.stream_completion(tool_request(ModelDescriptor::new(
            "gpt-4o-mini",
            "scripted",
        ))))
        .await;
    assert!(error.is_none());

    let StreamEvent::McpToolDetected(detected) = &events[0] else {
        panic!("expected detection first, got {:?}", events[0]);
    };
    assert_eq!(detected.mcp_server, "web");
    assert!(detected.input.is_none());

    let StreamEvent::McpToolStart(started) = &events[1] else {
        panic!("expected start second, got {:?}", events[1]);
    };
    assert_eq!(started.input, Some(json!({"q": "weather"})));
    assert!(started.timestamp.is_none());

    let StreamEvent::McpToolResult(result) = &events[2] else {
        panic!("expected result third, got {:?}", events[2]);
    };
    assert!(result.is_success());
    assert_eq!(result.output, Some(json!({"answer": "sunny"})));
    assert!(result.timestamp.is_some());
    assert!(result.duration.is_some());

    assert!(matches!(&events[3], StreamEvent::Chunk(text) if text == "done"));

    let Some(StreamEvent::Completed(outcome)) = events.last() else {
        panic!("stream should end with the aggregated outcome");
    };
    assert_eq!(outcome.full_response, "done");
    assert_eq!(outcome.used_tools.iter().collect::<Vec<_>>(), ["search"]);
    assert_eq!(outcome.rounds, 2);

    // Reasoning never flows back into history.
    let captured = provider.captured();
    assert_eq!(captured[1].messages[2].tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn streaming_tool_failure_emits_error_event_and_continues() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        RoundScript::Stream(vec![Ok(ChunkItem::Completed(
            CompletionMessage::text("").with_tool_calls(vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "broken".to_string(),
                arguments: "{}".to_string(),
            }]),
        ))]),
        RoundScript::Stream(vec![Ok(ChunkItem::Completed(CompletionMessage::text(
            "recovered",
        )))]),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("go"))
        .build()
        .expect("request should build");

    let (events, error) = collect(engine.stream_completion(request)).await;
    assert!(error.is_none());

    assert!(matches!(&events[0], StreamEvent::McpToolStart(_)));
    let StreamEvent::McpToolError(record) = &events[1] else {
        panic!("expected a tool error event, got {:?}", events[1]);
    };
    assert!(record.error.as_deref().unwrap().contains("tool exploded"));

    let Some(StreamEvent::Completed(outcome)) = events.last() else {
        panic!("stream should end with the aggregated outcome");
    };
    assert!(outcome.used_tools.is_empty());
    assert_eq!(outcome.final_completion.content, "recovered");
}

#[tokio::test]
async fn streaming_malformed_arguments_fail_the_call_not_the_stream() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        RoundScript::Stream(vec![Ok(ChunkItem::Completed(
            CompletionMessage::text("").with_tool_calls(vec![search_call("call_1", "{not json")]),
        ))]),
        RoundScript::Stream(vec![Ok(ChunkItem::Completed(CompletionMessage::text(
            "done",
        )))]),
    ]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let (events, error) =
        collect(engine.stream_completion(tool_request(ModelDescriptor::new(
            "gpt-4o-mini",
            "scripted",
        ))))
        .await;
    assert!(error.is_none());

    // A call that cannot even be parsed skips straight to the error event.
    let StreamEvent::McpToolError(record) = &events[0] else {
        panic!("expected a tool error event, got {:?}", events[0]);
    };
    assert!(record.error.as_deref().unwrap().contains("invalid JSON"));
    assert!(matches!(events.last(), Some(StreamEvent::Completed(_))));
}

#[tokio::test]
async fn streaming_round_cap_surfaces_tool_loop_exceeded() {
    let looping_round = || {
        RoundScript::Stream(vec![Ok(ChunkItem::Completed(
            CompletionMessage::text("").with_tool_calls(vec![search_call("call_n", "{}")]),
        ))])
    };
    let provider = Arc::new(ScriptedProvider::new(vec![looping_round(), looping_round()]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::with_max_rounds(1));

    let (events, error) =
        collect(engine.stream_completion(tool_request(ModelDescriptor::new(
            "gpt-4o-mini",
            "scripted",
        ))))
        .await;

    let error = error.expect("stream should fail");
    assert_eq!(error.kind, EngineErrorKind::ToolLoopExceeded);
    assert!(!events.iter().any(|event| matches!(event, StreamEvent::Completed(_))));
}

#[tokio::test]
async fn streaming_without_finalized_message_is_a_provider_error() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Stream(vec![Ok(
        ChunkItem::Chunk(StreamChunk::content("partial")),
    )])]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let (events, error) = collect(engine.stream_completion(request)).await;

    assert!(matches!(&events[0], StreamEvent::Chunk(text) if text == "partial"));
    let error = error.expect("stream should fail");
    assert_eq!(error.kind, EngineErrorKind::Provider);
    assert!(error.message.contains("without a finalized message"));
}

#[tokio::test]
async fn provider_failures_abort_the_blocking_call() {
    let provider = Arc::new(ScriptedProvider::new(Vec::new()));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let error = engine
        .execute_completion(request)
        .await
        .expect_err("completion should fail");

    assert_eq!(error.kind, EngineErrorKind::Provider);
}

#[tokio::test]
async fn pumped_streams_produce_the_documented_wire_frames() {
    let provider = Arc::new(ScriptedProvider::new(vec![RoundScript::Stream(vec![
        Ok(ChunkItem::Chunk(StreamChunk::content("Hel"))),
        Ok(ChunkItem::Chunk(StreamChunk::content("lo"))),
        Ok(ChunkItem::Completed(CompletionMessage::text("Hello"))),
    ])]));
    let engine = engine_with(Arc::clone(&provider), RoundPolicy::default());

    let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "scripted"))
        .message(Message::user("hi"))
        .build()
        .expect("request should build");

    let mut frames = Vec::new();
    let outcome = kengine::sse::pump(engine.stream_completion(request), |frame| {
        frames.push(frame.to_string())
    })
    .await
    .expect("pump should complete");

    assert_eq!(outcome.full_response, "Hello");
    assert_eq!(
        frames,
        vec![
            "data: {\"type\":\"chunk\",\"data\":\"Hel\"}\n\n".to_string(),
            "data: {\"type\":\"chunk\",\"data\":\"lo\"}\n\n".to_string(),
        ]
    );
}
