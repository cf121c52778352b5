//! Routing from model-facing tool names to the server and tool that serve
//! them.

use std::collections::HashMap;

/// Where a model-facing tool name actually executes: a named server and the
/// tool it exposes there. The caller builds routes when it advertises tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRoute {
    pub server: String,
    pub tool: String,
}

impl ToolRoute {
    pub fn new(server: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            tool: tool.into(),
        }
    }
}

/// Lookup table keyed by the tool name the model emits in its calls.
pub type ToolRouteMap = HashMap<String, ToolRoute>;
