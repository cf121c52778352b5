//! Common `kprovider` imports for downstream crates.

pub use crate::{
    BoxedChunkStream, ChunkItem, ChunkStream, CompletionMessage, CompletionRequest,
    CompletionRequestBuilder, Message, ModelDescriptor, ModelOptionEntry, ProviderClient,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderRegistry, Role, StreamChunk,
    ToolCallFragment, ToolCallRequest, ToolChoice, ToolDefinition, VecChunkStream,
    resolve_model_options,
};
pub use kcommon::{BoxFuture, MetadataMap};
