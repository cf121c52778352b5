//! Immutable bookkeeping records for tool executions, shaped for the wire.
//!
//! ```rust
//! use ktooling::ToolExecutionRecord;
//! use serde_json::json;
//!
//! let record = ToolExecutionRecord::detected("call_1", "web", "search")
//!     .started(json!({"q": "weather"}))
//!     .begin()
//!     .succeed(json!({"answer": "sunny"}));
//! assert!(record.is_success());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kcommon::now_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Success,
    Error,
}

/// One tool execution, from detection through completion. A record starts
/// with null input and timing, gains its input when the call is prepared, a
/// start time when execution begins, and is sealed by exactly one of
/// [`succeed`](Self::succeed) or [`fail`](Self::fail). Field order is part
/// of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    pub id: String,
    #[serde(rename = "mcpServer")]
    pub mcp_server: String,
    pub tool: String,
    pub error: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub timestamp: Option<u64>,
    pub status: ToolCallStatus,
    pub duration: Option<u64>,
}

impl ToolExecutionRecord {
    pub fn detected(
        id: impl Into<String>,
        mcp_server: impl Into<String>,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            mcp_server: mcp_server.into(),
            tool: tool.into(),
            error: None,
            input: None,
            output: None,
            timestamp: None,
            status: ToolCallStatus::Success,
            duration: None,
        }
    }

    /// Attaches the parsed input. Timing stays null until
    /// [`begin`](Self::begin); start announcements go on the wire without a
    /// timestamp.
    pub fn started(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Stamps the execution start time.
    pub fn begin(mut self) -> Self {
        self.timestamp = Some(now_ms());
        self
    }

    pub fn succeed(mut self, output: Value) -> Self {
        self.status = ToolCallStatus::Success;
        self.output = Some(output);
        self.error = None;
        self.stamp_duration();
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = ToolCallStatus::Error;
        self.error = Some(error.into());
        self.output = None;
        self.stamp_duration();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolCallStatus::Success
    }

    fn stamp_duration(&mut self) {
        let ended = now_ms();
        let started = self.timestamp.unwrap_or(ended);
        self.duration = Some(ended.saturating_sub(started));
    }
}
