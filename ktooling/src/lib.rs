//! Capability layer: routing model-issued tool calls, executing them, and
//! recording every execution in the wire-shaped record format.

mod args;
mod error;
mod executor;
mod record;
mod registry;
mod route;
mod tool;

pub mod prelude {
    pub use crate::{
        FunctionTool, RegistryToolExecutor, Tool, ToolCallStatus, ToolError, ToolErrorKind,
        ToolExecutionRecord, ToolExecutor, ToolFuture, ToolInvocation, ToolOutcome, ToolRegistry,
        ToolRoute, ToolRouteMap, UnconfiguredToolExecutor,
    };
}

pub use args::{parse_json_object, parse_tool_arguments, required_string};
pub use error::{ToolError, ToolErrorKind};
pub use executor::{
    RegistryToolExecutor, ToolExecutor, ToolInvocation, ToolOutcome, UnconfiguredToolExecutor,
    record_for_call,
};
pub use record::{ToolCallStatus, ToolExecutionRecord};
pub use registry::ToolRegistry;
pub use route::{ToolRoute, ToolRouteMap};
pub use tool::{FunctionTool, Tool, ToolFuture};
