//! Single-import surface for applications built on keel.

pub use kcommon::{BoxFuture, MetadataMap};
pub use kengine::{
    CompletionEngine, CompletionEngineBuilder, CompletionOutcome, EngineError, EngineErrorKind,
    EngineEventStream, EngineRequest, ReasoningTrace, RoundPolicy, StreamEvent, StreamOutcome, sse,
};
pub use kprovider::{
    BoxedChunkStream, ChunkItem, ChunkStream, CompletionMessage, CompletionRequest, Message,
    ModelDescriptor, ModelOptionEntry, ProviderClient, ProviderError, ProviderErrorKind,
    ProviderRegistry, Role, StreamChunk, ToolCallRequest, ToolDefinition, VecChunkStream,
    resolve_model_options,
};
pub use ktooling::{
    FunctionTool, RegistryToolExecutor, Tool, ToolError, ToolErrorKind, ToolExecutionRecord,
    ToolExecutor, ToolOutcome, ToolRegistry, ToolRoute, ToolRouteMap,
};

pub use crate::util::{assistant_message, system_message, tool_message, user_message};
