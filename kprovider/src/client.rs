//! The provider client contract and a string-keyed client registry.

use std::sync::Arc;

use kcommon::{BoxFuture, Registry};

use crate::{BoxedChunkStream, CompletionMessage, CompletionRequest, ProviderError};

pub type ProviderFuture<'a, T> = BoxFuture<'a, T>;

/// A client for one upstream model provider. Credential resolution happens
/// before a client is constructed; the engine only sees this surface.
pub trait ProviderClient: Send + Sync {
    /// The provider key a [`crate::ModelDescriptor`] addresses this client by.
    fn key(&self) -> &str;

    /// Blocking form: one request, one finalized assistant message.
    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<CompletionMessage, ProviderError>>;

    /// Streaming form: a chunk stream terminated by one
    /// [`crate::ChunkItem::Completed`] carrying the finalized message.
    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>>;
}

/// Registry of provider clients keyed by provider key.
#[derive(Default)]
pub struct ProviderRegistry {
    clients: Registry<String, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C>(&mut self, client: C)
    where
        C: ProviderClient + 'static,
    {
        let key = client.key().to_string();
        self.clients.insert(key, Arc::new(client));
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ProviderClient>> {
        self.clients.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.clients.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<dyn ProviderClient>> {
        self.clients.remove(key)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
