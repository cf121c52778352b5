//! Provider-agnostic message, tool, and request types.
//!
//! ```rust
//! use kprovider::{CompletionRequest, Message, ProviderErrorKind};
//!
//! let ok = CompletionRequest::builder("gpt-4o-mini")
//!     .message(Message::user("Summarize this diff"))
//!     .build();
//! assert!(ok.is_ok());
//!
//! let err = CompletionRequest::builder("").build().err().expect("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use kcommon::MetadataMap;

use crate::{ModelOptionEntry, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One element of the conversation history. History is append-only; messages
/// are never reordered or deleted once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Present only on `tool` messages; matches the originating call id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
    /// Present only on assistant messages that requested tool calls, so a
    /// provider can replay earlier rounds faithfully.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// A callable capability advertised to the model. Supplied by the caller and
/// read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A model-issued request to invoke a named tool. `arguments` is the raw
/// JSON-encoded object exactly as the model emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// A partial tool call observed mid-stream. Accretion of name and argument
/// fragments into a complete [`ToolCallRequest`] is the provider client's
/// responsibility; consumers only get a best-effort early signal here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub id: String,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// A finalized assistant turn as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub content: String,
    /// Secondary deliberation channel some models emit. Never replayed into
    /// subsequent requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The history form of this turn: content and tool calls survive, the
    /// reasoning channel is dropped.
    pub fn to_history_message(&self) -> Message {
        Message::assistant(self.content.clone()).with_tool_calls(self.tool_calls.clone())
    }
}

/// The model handle the caller resolved outside the engine: which model to
/// address, which provider serves it, and its declarative option entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub model_name: String,
    pub provider_key: String,
    pub config_entries: Vec<ModelOptionEntry>,
}

impl ModelDescriptor {
    pub fn new(model_name: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            provider_key: provider_key.into(),
            config_entries: Vec::new(),
        }
    }

    pub fn with_config_entries(mut self, config_entries: Vec<ModelOptionEntry>) -> Self {
        self.config_entries = config_entries;
        self
    }
}

/// Tool selection directive sent alongside a non-empty tool list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
}

/// One provider call: the full history so far plus merged request options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: Map<String, Value>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
    pub metadata: MetadataMap,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequestBuilder {
    model: String,
    messages: Vec<Message>,
    options: Map<String, Value>,
    tools: Vec<ToolDefinition>,
    metadata: MetadataMap,
    stream: bool,
}

impl CompletionRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: Map::new(),
            tools: Vec::new(),
            metadata: MetadataMap::new(),
            stream: false,
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn enable_streaming(self) -> Self {
        self.streaming(true)
    }

    /// The tool-choice directive is attached only when tools are present.
    pub fn build(self) -> Result<CompletionRequest, ProviderError> {
        let tool_choice = if self.tools.is_empty() {
            None
        } else {
            Some(ToolChoice::Auto)
        };

        let request = CompletionRequest {
            model: self.model,
            messages: self.messages,
            options: self.options,
            tools: self.tools,
            tool_choice,
            metadata: self.metadata,
            stream: self.stream,
        };

        request.validate()?;
        Ok(request)
    }
}
