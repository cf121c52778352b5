//! Provider client for OpenAI-compatible chat-completion endpoints,
//! including the `reasoning_content` channel emitted by DeepSeek-style
//! models.

use std::collections::BTreeMap;

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    BoxedChunkStream, ChunkItem, CompletionMessage, CompletionRequest, Message, ProviderClient,
    ProviderError, ProviderFuture, StreamChunk, ToolCallFragment, ToolCallRequest, ToolChoice,
};

/// HTTP client for any endpoint speaking the OpenAI chat-completion wire
/// protocol. Credential resolution stays with the caller; this adapter takes
/// a ready bearer token.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    key: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, body: &Map<String, Value>) -> Result<Response, ProviderError> {
        let mut builder = self.client.post(self.endpoint()).json(body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::timeout(err.to_string())
            } else {
                ProviderError::transport(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(classify_http_error(response).await);
        }

        Ok(response)
    }
}

impl ProviderClient for OpenAiCompatibleClient {
    fn key(&self) -> &str {
        &self.key
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<CompletionMessage, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let body = build_body(&request, false);
            let response = self.send(&body).await?;

            let parsed: ApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::malformed_response(err.to_string()))?;

            convert_response(parsed)
        })
    }

    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let body = build_body(&request, true);
            let response = self.send(&body).await?;

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut lines = SseLineBuffer::default();
                let mut accumulator = ToolCallAccumulator::default();
                let mut content = String::new();
                let mut reasoning = String::new();

                'receive: while let Some(item) = bytes.next().await {
                    let data = item.map_err(|err| ProviderError::transport(err.to_string()))?;
                    let text = std::str::from_utf8(&data)
                        .map_err(|err| ProviderError::malformed_response(err.to_string()))?;

                    for payload in lines.push(text) {
                        if payload == "[DONE]" {
                            break 'receive;
                        }

                        let parsed: ApiStreamResponse = serde_json::from_str(&payload)
                            .map_err(|err| ProviderError::malformed_response(err.to_string()))?;

                        let Some(choice) = parsed.choices.into_iter().next() else {
                            continue;
                        };

                        let chunk = accumulator.apply(choice.delta, &mut content, &mut reasoning);
                        if chunk != StreamChunk::default() {
                            yield ChunkItem::Chunk(chunk);
                        }
                    }
                }

                let mut message = CompletionMessage::text(content)
                    .with_tool_calls(accumulator.into_tool_calls());
                if !reasoning.is_empty() {
                    message = message.with_reasoning(reasoning);
                }

                yield ChunkItem::Completed(message);
            };

            Ok(Box::pin(stream) as BoxedChunkStream<'a>)
        })
    }
}

/// Builds the request body: merged option entries first, then the fixed
/// fields, so a stray option cannot clobber the model or history.
fn build_body(request: &CompletionRequest, stream: bool) -> Map<String, Value> {
    let mut body = request.options.clone();
    body.insert("model".to_string(), Value::String(request.model.clone()));
    body.insert(
        "messages".to_string(),
        Value::Array(request.messages.iter().map(api_message).collect()),
    );

    if !request.tools.is_empty() {
        body.insert(
            "tools".to_string(),
            Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.parameters,
                            },
                        })
                    })
                    .collect(),
            ),
        );

        if let Some(ToolChoice::Auto) = request.tool_choice {
            body.insert("tool_choice".to_string(), Value::String("auto".to_string()));
        }
    }

    body.insert("stream".to_string(), Value::Bool(stream));
    body
}

fn api_message(message: &Message) -> Value {
    let mut entry = Map::new();
    entry.insert(
        "role".to_string(),
        json!(message.role),
    );
    entry.insert("content".to_string(), Value::String(message.content.clone()));

    if let Some(tool_call_id) = &message.tool_call_id {
        entry.insert(
            "tool_call_id".to_string(),
            Value::String(tool_call_id.clone()),
        );
    }

    if !message.tool_calls.is_empty() {
        entry.insert(
            "tool_calls".to_string(),
            Value::Array(
                message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments,
                            },
                        })
                    })
                    .collect(),
            ),
        );
    }

    Value::Object(entry)
}

fn convert_response(response: ApiResponse) -> Result<CompletionMessage, ProviderError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        ProviderError::malformed_response("completion response did not include choices")
    })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect::<Vec<_>>();

    let mut message =
        CompletionMessage::text(choice.message.content.unwrap_or_default()).with_tool_calls(tool_calls);
    if let Some(reasoning) = choice.message.reasoning_content
        && !reasoning.is_empty()
    {
        message = message.with_reasoning(reasoning);
    }

    Ok(message)
}

async fn classify_http_error(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("chat completion request failed with status {status}"));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            ProviderError::unavailable(message)
        }
        _ => ProviderError::transport(message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

/// Splits an SSE byte stream into `data:` payloads across chunk boundaries.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: String,
}

impl SseLineBuffer {
    fn push(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);

        let mut payloads = Vec::new();
        while let Some(newline_index) = self.pending.find('\n') {
            let line = self.pending.drain(..=newline_index).collect::<String>();
            let line = line.trim();

            if let Some(payload) = line.strip_prefix("data:") {
                payloads.push(payload.trim().to_string());
            }
        }

        payloads
    }
}

/// Accretes partial tool calls by choice index across deltas, per the
/// provider-side accretion contract.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    calls: BTreeMap<u32, ToolCallRequest>,
}

impl ToolCallAccumulator {
    fn apply(
        &mut self,
        delta: ApiStreamDelta,
        content: &mut String,
        reasoning: &mut String,
    ) -> StreamChunk {
        let mut chunk = StreamChunk::default();

        if let Some(text) = delta.content
            && !text.is_empty()
        {
            content.push_str(&text);
            chunk.content = Some(text);
        }

        if let Some(text) = delta.reasoning_content
            && !text.is_empty()
        {
            reasoning.push_str(&text);
            chunk.reasoning = Some(text);
        }

        for delta_call in delta.tool_calls.unwrap_or_default() {
            let index = delta_call.index.unwrap_or(0);
            let entry = self.calls.entry(index).or_insert_with(|| ToolCallRequest {
                id: delta_call
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("tool_call_{index}")),
                name: String::new(),
                arguments: String::new(),
            });

            if let Some(id) = &delta_call.id {
                entry.id = id.clone();
            }

            let mut fragment_name = None;
            let mut fragment_arguments = None;
            if let Some(function) = delta_call.function {
                if let Some(name) = function.name {
                    entry.name = name.clone();
                    fragment_name = Some(name);
                }

                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                    fragment_arguments = Some(arguments);
                }
            }

            chunk.tool_call_fragments.push(ToolCallFragment {
                id: entry.id.clone(),
                name: fragment_name,
                arguments: fragment_arguments,
            });
        }

        chunk
    }

    fn into_tool_calls(self) -> Vec<ToolCallRequest> {
        self.calls.into_values().collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiAssistantMessage,
}

#[derive(Debug, Deserialize)]
struct ApiAssistantMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiToolFunction,
}

#[derive(Debug, Deserialize)]
struct ApiToolFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiStreamResponse {
    choices: Vec<ApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChoice {
    delta: ApiStreamDelta,
}

#[derive(Debug, Deserialize)]
struct ApiStreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    tool_calls: Option<Vec<ApiDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiDeltaToolCall {
    index: Option<u32>,
    id: Option<String>,
    function: Option<ApiDeltaToolFunction>,
}

#[derive(Debug, Deserialize)]
struct ApiDeltaToolFunction {
    name: Option<String>,
    arguments: Option<String>,
}
