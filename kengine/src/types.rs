//! Engine request and outcome types.
//!
//! ```rust
//! use kengine::{EngineRequest, RoundPolicy};
//! use kprovider::{Message, ModelDescriptor};
//!
//! let request = EngineRequest::builder(ModelDescriptor::new("gpt-4o-mini", "openai"))
//!     .message(Message::user("hi"))
//!     .build()
//!     .expect("request should build");
//! assert_eq!(request.messages.len(), 1);
//!
//! assert!(RoundPolicy::default().validate().is_ok());
//! assert!(RoundPolicy::with_max_rounds(0).validate().is_err());
//! ```

use std::collections::BTreeSet;

use serde::Serialize;

use kprovider::{CompletionMessage, Message, ModelDescriptor, ToolDefinition};
use ktooling::{ToolExecutionRecord, ToolRoute, ToolRouteMap};

use crate::EngineError;

/// Caps the round loop. A model that keeps requesting tools past the cap
/// fails the call with a tool-loop-exceeded error instead of looping
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPolicy {
    /// Maximum number of model calls within one engine call.
    pub max_rounds: u32,
}

impl RoundPolicy {
    pub const DEFAULT_MAX_ROUNDS: u32 = 8;

    pub fn with_max_rounds(max_rounds: u32) -> Self {
        Self { max_rounds }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_rounds == 0 {
            return Err(EngineError::invalid_request(
                "max_rounds must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl Default for RoundPolicy {
    fn default() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }
}

/// One engine call: the model handle, the conversation so far, the tools
/// advertised to the model, and the routes that serve them.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub model: ModelDescriptor,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub routes: ToolRouteMap,
}

impl EngineRequest {
    pub fn builder(model: ModelDescriptor) -> EngineRequestBuilder {
        EngineRequestBuilder::new(model)
    }
}

#[derive(Debug, Clone)]
pub struct EngineRequestBuilder {
    model: ModelDescriptor,
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    routes: ToolRouteMap,
}

impl EngineRequestBuilder {
    pub fn new(model: ModelDescriptor) -> Self {
        Self {
            model,
            messages: Vec::new(),
            tools: Vec::new(),
            routes: ToolRouteMap::new(),
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

    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn route(mut self, name: impl Into<String>, route: ToolRoute) -> Self {
        self.routes.insert(name.into(), route);
        self
    }

    pub fn routes(mut self, routes: ToolRouteMap) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn build(self) -> Result<EngineRequest, EngineError> {
        if self.messages.is_empty() {
            return Err(EngineError::invalid_request(
                "at least one message is required",
            ));
        }

        Ok(EngineRequest {
            model: self.model,
            messages: self.messages,
            tools: self.tools,
            routes: self.routes,
        })
    }
}

/// Result of a blocking engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub response: CompletionMessage,
    pub tool_calls: Vec<ToolExecutionRecord>,
    /// Names of tools that executed successfully at least once.
    pub used_tools: BTreeSet<String>,
    pub rounds: u32,
}

/// Timing and text of the reasoning channel observed during streaming.
/// `started_at` is set by the first reasoning chunk and never changes;
/// `ended_at` moves forward with every reasoning chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReasoningTrace {
    pub content: String,
    pub started_at: Option<u64>,
    pub ended_at: Option<u64>,
}

impl ReasoningTrace {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub(crate) fn observe(&mut self, text: &str, at: u64) {
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
        self.ended_at = Some(at);
        self.content.push_str(text);
    }
}

/// Result of a streaming engine call, carried by the terminal stream event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamOutcome {
    /// Concatenation of every content chunk, in emission order.
    pub full_response: String,
    pub final_completion: CompletionMessage,
    pub tool_calls: Vec<ToolExecutionRecord>,
    pub used_tools: BTreeSet<String>,
    pub reasoning: ReasoningTrace,
    pub rounds: u32,
}
