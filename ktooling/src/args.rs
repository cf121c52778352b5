//! JSON argument parsing helpers for tool calls and tool authors.
//!
//! ```rust
//! use ktooling::{parse_tool_arguments, required_string};
//! use serde_json::json;
//!
//! let input = parse_tool_arguments(r#"{"query":"rust"}"#).expect("object should parse");
//! assert_eq!(input, json!({"query": "rust"}));
//!
//! let empty = parse_tool_arguments("").expect("blank falls back to an empty object");
//! assert_eq!(empty, json!({}));
//! ```

use serde_json::{Map, Value, json};

use crate::ToolError;

/// Parses the raw argument string a model attached to a tool call. A blank
/// string falls back to an empty object; anything else must be valid JSON.
pub fn parse_tool_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }

    serde_json::from_str(raw)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}

pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ToolError> {
    let value = parse_tool_arguments(raw)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ToolError::invalid_arguments("expected JSON object arguments"))
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}
