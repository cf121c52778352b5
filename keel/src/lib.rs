//! Unified facade over the keel workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the engine, provider, and tooling crates and provides
//! convenience helpers for common setup flows.
//!
//! ```rust
//! use keel::prelude::*;
//!
//! let model = ModelDescriptor::new("gpt-4o-mini", "openai");
//! let request = EngineRequest::builder(model)
//!     .message(user_message("What's the weather?"))
//!     .build()
//!     .expect("request should build");
//! assert_eq!(request.messages[0].role, Role::User);
//! ```

pub mod prelude;
pub mod util;

pub use kcommon;
pub use kengine;
pub use kprovider;
pub use ktooling;

pub use kengine::{
    CompletionEngine, CompletionEngineBuilder, CompletionOutcome, EngineError, EngineErrorKind,
    EngineEventStream, EngineRequest, EngineRequestBuilder, ReasoningTrace, RoundPolicy,
    StreamEvent, StreamOutcome,
};
pub use kprovider::{
    BoxedChunkStream, ChunkItem, ChunkStream, CompletionMessage, CompletionRequest,
    CompletionRequestBuilder, Message, ModelDescriptor, ModelOptionEntry, ProviderClient,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderRegistry, Role, StreamChunk,
    ToolCallFragment, ToolCallRequest, ToolChoice, ToolDefinition, VecChunkStream,
    resolve_model_options,
};
pub use ktooling::{
    FunctionTool, RegistryToolExecutor, Tool, ToolCallStatus, ToolError, ToolErrorKind,
    ToolExecutionRecord, ToolExecutor, ToolFuture, ToolInvocation, ToolOutcome, ToolRegistry,
    ToolRoute, ToolRouteMap, UnconfiguredToolExecutor, parse_json_object, parse_tool_arguments,
    required_string,
};

pub use util::{
    assistant_message, engine_with_registry, system_message, tool_message, user_message,
};
