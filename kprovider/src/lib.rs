//! Provider abstraction for the keel engine: message and request types, the
//! declarative option merge, chunked streaming contracts, and the
//! [`ProviderClient`] trait the engine drives.
//!
//! ```rust
//! use kprovider::prelude::*;
//!
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .message(Message::system("You are terse."))
//!     .message(Message::user("Say hi"))
//!     .build()
//!     .expect("request should build");
//! assert_eq!(request.messages.len(), 2);
//! ```

pub mod adapters;
mod client;
mod error;
mod model;
mod options;
pub mod prelude;
mod stream;

pub use client::{ProviderClient, ProviderFuture, ProviderRegistry};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    CompletionMessage, CompletionRequest, CompletionRequestBuilder, Message, ModelDescriptor,
    Role, ToolCallFragment, ToolCallRequest, ToolChoice, ToolDefinition,
};
pub use options::{ModelOptionEntry, resolve_model_options};
pub use stream::{BoxedChunkStream, ChunkItem, ChunkStream, StreamChunk, VecChunkStream};
