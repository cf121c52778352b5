//! The tool executor contract: every model-issued call produces exactly one
//! outcome, index-aligned with the call that produced it. Failures are
//! outcomes, not errors, so a broken tool never aborts a conversation.

use std::sync::Arc;

use kprovider::ToolCallRequest;
use serde_json::{Value, json};

use crate::{
    ToolError, ToolExecutionRecord, ToolFuture, ToolRegistry, ToolRoute, ToolRouteMap,
    parse_tool_arguments,
};

/// Builds the initial record for a model-issued call. Unrouted calls keep
/// the model-facing tool name and fall back to the local server label.
pub fn record_for_call(call: &ToolCallRequest, route: Option<&ToolRoute>) -> ToolExecutionRecord {
    match route {
        Some(route) => ToolExecutionRecord::detected(&call.id, &route.server, &route.tool),
        None => ToolExecutionRecord::detected(&call.id, "local", &call.name),
    }
}

/// A call ready to execute: route resolved, arguments parsed, record started.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub call: ToolCallRequest,
    pub route: Option<ToolRoute>,
    pub input: Value,
    pub record: ToolExecutionRecord,
}

impl ToolInvocation {
    /// Parses the call's raw arguments and starts its record. A call with
    /// unparseable arguments never reaches an executor; it comes back as a
    /// ready-made failure outcome instead.
    pub fn prepare(
        call: ToolCallRequest,
        route: Option<&ToolRoute>,
    ) -> Result<Self, Box<ToolOutcome>> {
        let record = record_for_call(&call, route);

        match parse_tool_arguments(&call.arguments) {
            Ok(input) => Ok(Self {
                record: record.started(input.clone()),
                route: route.cloned(),
                input,
                call,
            }),
            Err(error) => Err(Box::new(ToolOutcome::failure(
                call.name.clone(),
                record,
                error.to_string(),
            ))),
        }
    }

    /// Stamps the record's start time. Callers do this at the moment
    /// execution is handed to an executor, after any start announcement has
    /// gone out with null timing.
    pub fn begin(mut self) -> Self {
        self.record = self.record.begin();
        self
    }

    /// The registry lookup name: the routed tool name when a route exists,
    /// otherwise the name the model emitted.
    pub fn target_tool(&self) -> &str {
        self.route
            .as_ref()
            .map(|route| route.tool.as_str())
            .unwrap_or(&self.call.name)
    }
}

/// The result of one tool execution. `result` is what goes back to the model
/// as a tool message; `record` is the bookkeeping and wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// The model-facing tool name, as emitted in the originating call.
    pub tool_name: String,
    pub result: Value,
    pub record: ToolExecutionRecord,
}

impl ToolOutcome {
    pub fn success(tool_name: impl Into<String>, record: ToolExecutionRecord, result: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            record: record.succeed(result.clone()),
            result,
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        record: ToolExecutionRecord,
        error: impl Into<String>,
    ) -> Self {
        let message = error.into();
        Self {
            tool_name: tool_name.into(),
            result: json!({"error": message}),
            record: record.fail(message),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.record.is_success()
    }

    /// The serialized form appended to history as the tool message content.
    /// Error outcomes serialize too, so the model can react to the failure.
    pub fn history_content(&self) -> String {
        serde_json::to_string(&self.result).unwrap_or_default()
    }
}

pub trait ToolExecutor: Send + Sync {
    fn execute<'a>(&'a self, invocation: ToolInvocation) -> ToolFuture<'a, ToolOutcome>;

    /// Executes a batch of calls sequentially, preserving call order. The
    /// returned outcomes are index-aligned with `calls`.
    fn execute_ordered<'a>(
        &'a self,
        calls: Vec<ToolCallRequest>,
        routes: &'a ToolRouteMap,
    ) -> ToolFuture<'a, Vec<ToolOutcome>> {
        Box::pin(async move {
            let mut outcomes = Vec::with_capacity(calls.len());

            for call in calls {
                let route = routes.get(&call.name);
                match ToolInvocation::prepare(call, route) {
                    Ok(invocation) => outcomes.push(self.execute(invocation.begin()).await),
                    Err(outcome) => outcomes.push(*outcome),
                }
            }

            outcomes
        })
    }
}

/// Fallback executor for conversations that advertise no tools. Any call
/// that somehow reaches it fails cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredToolExecutor;

impl ToolExecutor for UnconfiguredToolExecutor {
    fn execute<'a>(&'a self, invocation: ToolInvocation) -> ToolFuture<'a, ToolOutcome> {
        Box::pin(async move {
            ToolOutcome::failure(
                invocation.call.name.clone(),
                invocation.record.clone(),
                format!(
                    "no tool executor is configured; cannot execute '{}'",
                    invocation.call.name
                ),
            )
        })
    }
}

/// Executor backed by an in-process [`ToolRegistry`].
#[derive(Clone, Default)]
pub struct RegistryToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl RegistryToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ToolExecutor for RegistryToolExecutor {
    fn execute<'a>(&'a self, invocation: ToolInvocation) -> ToolFuture<'a, ToolOutcome> {
        Box::pin(async move {
            let Some(tool) = self.registry.get(invocation.target_tool()) else {
                return ToolOutcome::failure(
                    invocation.call.name.clone(),
                    invocation.record.clone(),
                    ToolError::not_found(format!(
                        "tool '{}' is not registered",
                        invocation.target_tool()
                    ))
                    .with_tool_call_id(invocation.call.id.clone())
                    .to_string(),
                );
            };

            match tool.invoke(&invocation.input).await {
                Ok(result) => ToolOutcome::success(
                    invocation.call.name.clone(),
                    invocation.record.clone(),
                    result,
                ),
                Err(error) => ToolOutcome::failure(
                    invocation.call.name.clone(),
                    invocation.record.clone(),
                    error.to_string(),
                ),
            }
        })
    }
}
