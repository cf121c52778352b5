//! Streaming chunk contracts and in-memory stream utilities.
//!
//! ```rust
//! use kprovider::{BoxedChunkStream, ChunkItem, CompletionMessage, VecChunkStream};
//!
//! let stream = VecChunkStream::new(vec![Ok(ChunkItem::Completed(
//!     CompletionMessage::text("done"),
//! ))]);
//! let _boxed: BoxedChunkStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{CompletionMessage, ProviderError, ToolCallFragment};

/// One incremental unit of a streamed model response. Any combination of the
/// fields may be present in a single chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamChunk {
    pub content: Option<String>,
    pub reasoning: Option<String>,
    pub tool_call_fragments: Vec<ToolCallFragment>,
}

impl StreamChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_fragment(fragment: ToolCallFragment) -> Self {
        Self {
            tool_call_fragments: vec![fragment],
            ..Self::default()
        }
    }
}

/// An element of a provider chunk stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkItem {
    Chunk(StreamChunk),
    /// The finalized assistant message for the round. Terminal: when present
    /// it arrives after every delta, and the stream ends after it.
    Completed(CompletionMessage),
}

/// Provider chunk stream contract.
///
/// Invariants for consumers:
/// - Items arrive in source order.
/// - `Chunk` may appear zero or more times.
/// - Exactly one `Completed` closes a well-formed stream; a stream that ends
///   without one is a malformed provider response.
pub trait ChunkStream: Stream<Item = Result<ChunkItem, ProviderError>> + Send {}

impl<T> ChunkStream for T where T: Stream<Item = Result<ChunkItem, ProviderError>> + Send {}

pub type BoxedChunkStream<'a> = Pin<Box<dyn ChunkStream + 'a>>;

#[derive(Debug)]
pub struct VecChunkStream {
    items: VecDeque<Result<ChunkItem, ProviderError>>,
}

impl VecChunkStream {
    pub fn new(items: Vec<Result<ChunkItem, ProviderError>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl Stream for VecChunkStream {
    type Item = Result<ChunkItem, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ChunkItem, ProviderError>>> {
        Poll::Ready(self.items.pop_front())
    }
}
