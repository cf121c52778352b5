//! Convenience constructors for common setup flows.
//!
//! ```rust
//! use keel::util::{system_message, user_message};
//! use keel::Role;
//!
//! let messages = vec![
//!     system_message("You are concise."),
//!     user_message("Summarize the repo"),
//! ];
//! assert_eq!(messages[1].role, Role::User);
//! ```

use std::sync::Arc;

use kengine::{CompletionEngine, CompletionEngineBuilder};
use kprovider::{Message, ProviderClient};
use ktooling::{RegistryToolExecutor, ToolRegistry};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::assistant(content)
}

pub fn tool_message(content: impl Into<String>, tool_call_id: impl Into<String>) -> Message {
    Message::tool(content, tool_call_id)
}

/// Engine builder wired to a registry-backed tool executor.
pub fn engine_with_registry(
    provider: Arc<dyn ProviderClient>,
    registry: Arc<ToolRegistry>,
) -> CompletionEngineBuilder {
    CompletionEngine::builder(provider)
        .with_executor(Arc::new(RegistryToolExecutor::new(registry)))
}
