//! Pulling tool calls out of model output.
//!
//! A call is written by the model as
//!
//! ```text
//! <mcp_tool_call>
//!   <tool_name>read_file</tool_name>
//!   <arguments>{"file_path": "a.txt"}</arguments>
//! </mcp_tool_call>
//! ```
//!
//! Argument text goes through [`repair::repair_and_parse`] so that slightly
//! malformed JSON still yields a call.

pub mod repair;

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::types::ToolCallRequest;

pub use repair::{repair_and_parse, RepairError};

pub const ENVELOPE_OPEN: &str = "<mcp_tool_call>";
pub const ENVELOPE_CLOSE: &str = "</mcp_tool_call>";

const ARGUMENTS_OPEN: &str = "<arguments>";
const ARGUMENTS_CLOSE: &str = "</arguments>";

fn envelope_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<mcp_tool_call>(.*?)</mcp_tool_call>").expect("envelope pattern is valid")
    })
}

fn tool_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<tool_name>(.*?)</tool_name>").expect("tool name pattern is valid")
    })
}

/// First complete envelope in `text`, markers included.
pub fn find_envelope(text: &str) -> Option<&str> {
    envelope_regex().find(text).map(|m| m.as_str())
}

/// Parse the first tool call in `text`.
///
/// Returns `None` when there is no envelope, no name, no arguments tag, or
/// the arguments do not repair into a JSON object. An envelope without an
/// opening marker is accepted only when the text starts at `<tool_name>`.
pub fn extract_tool_call(text: &str) -> Option<ToolCallRequest> {
    let body = match envelope_regex().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => {
            let trimmed = text.trim_start();
            if !trimmed.starts_with("<tool_name>") {
                return None;
            }
            trimmed
        }
    };

    let name = tool_name_regex()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())?;

    let args_start = body.find(ARGUMENTS_OPEN)? + ARGUMENTS_OPEN.len();
    let rest = &body[args_start..];
    let end = rest
        .find(ARGUMENTS_CLOSE)
        .or_else(|| rest.find(ENVELOPE_CLOSE))
        .unwrap_or(rest.len());
    let raw_arguments = rest[..end].trim();

    let arguments = parse_arguments(name, raw_arguments)?;
    Some(ToolCallRequest::new(name, arguments))
}

/// Every tool call in `text`. The envelope format carries one call per turn,
/// so this holds zero or one request.
pub fn extract_tool_calls(text: &str) -> Vec<ToolCallRequest> {
    extract_tool_call(text).into_iter().collect()
}

fn parse_arguments(tool: &str, raw: &str) -> Option<Map<String, Value>> {
    if raw.is_empty() {
        return Some(Map::new());
    }
    match repair_and_parse(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            tracing::warn!(tool, kind = value_kind(&other), "tool arguments are not an object");
            None
        }
        Err(error) => {
            tracing::warn!(tool, %error, "could not repair tool arguments");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
