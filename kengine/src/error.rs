//! Engine errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

use kprovider::ProviderError;
use ktooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    InvalidRequest,
    Provider,
    Tooling,
    ToolLoopExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Provider, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Tooling, message)
    }

    pub fn tool_loop_exceeded(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::ToolLoopExceeded, message)
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for EngineError {}

impl From<ProviderError> for EngineError {
    fn from(error: ProviderError) -> Self {
        Self::provider(error.to_string())
    }
}

impl From<ToolError> for EngineError {
    fn from(error: ToolError) -> Self {
        Self::tooling(error.to_string())
    }
}
