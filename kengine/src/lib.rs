//! Round-loop completion engine: drives multi-round conversations between a
//! provider-backed model and caller-supplied tools, in blocking or streaming
//! delivery.
//!
//! ```rust
//! use kengine::{EngineRequest, RoundPolicy};
//! use kprovider::{Message, ModelDescriptor, ModelOptionEntry};
//! use serde_json::json;
//!
//! let model = ModelDescriptor::new("gpt-4o-mini", "openai")
//!     .with_config_entries(vec![ModelOptionEntry::new("temperature", json!(0.2))]);
//!
//! let request = EngineRequest::builder(model)
//!     .message(Message::user("What's the weather?"))
//!     .build()
//!     .expect("request should build");
//!
//! assert!(request.tools.is_empty());
//! assert_eq!(RoundPolicy::default().max_rounds, 8);
//! ```

mod engine;
mod error;
mod event;
pub mod sse;
mod types;

pub mod prelude {
    pub use crate::{
        CompletionEngine, CompletionEngineBuilder, CompletionOutcome, EngineError, EngineErrorKind,
        EngineEventStream, EngineRequest, ReasoningTrace, RoundPolicy, StreamEvent, StreamOutcome,
    };
    pub use kprovider::prelude::*;
    pub use ktooling::prelude::*;
}

pub use engine::{CompletionEngine, CompletionEngineBuilder, EngineEventStream};
pub use error::{EngineError, EngineErrorKind};
pub use event::StreamEvent;
pub use types::{
    CompletionOutcome, EngineRequest, EngineRequestBuilder, ReasoningTrace, RoundPolicy,
    StreamOutcome,
};
