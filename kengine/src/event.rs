//! Streaming events produced by the engine.

use serde::Serialize;

use ktooling::ToolExecutionRecord;

use crate::StreamOutcome;

/// One element of the engine's streaming event sequence. Variants tag their
/// payloads for the wire; tag names are a stable contract.
///
/// `Completed` is in-process only: it carries the aggregated outcome to the
/// consumer and closes a well-formed stream, but is never framed onto the
/// wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental answer text.
    Chunk(String),
    /// Incremental reasoning-channel text.
    Reasoning(String),
    /// A tool call named mid-stream, before execution. Lifecycle fields are
    /// still null.
    McpToolDetected(ToolExecutionRecord),
    /// Execution is starting; the record carries the parsed input.
    McpToolStart(ToolExecutionRecord),
    McpToolResult(ToolExecutionRecord),
    McpToolError(ToolExecutionRecord),
    Completed(StreamOutcome),
}
