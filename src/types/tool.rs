//! Tool catalog entries, extracted calls and their outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};

/// A tool advertised by the gateway catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema for the tool's arguments.
    #[serde(default = "empty_object")]
    pub parameters: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A tool invocation parsed out of model output.
///
/// The name is not guaranteed to exist in the catalog; the gateway decides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// `TOOL_CALL` event payload.
    pub fn event_payload(&self) -> Value {
        json!({ "name": self.name, "arguments": self.arguments })
    }
}

/// Whether a tool call succeeded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// The result of dispatching one [`ToolCallRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallOutcome {
    pub name: String,
    pub arguments: Map<String, Value>,
    pub status: ToolStatus,
    /// Tool result on success, error message string on failure.
    pub payload: Value,
}

impl ToolCallOutcome {
    pub fn success(request: &ToolCallRequest, payload: Value) -> Self {
        Self {
            name: request.name.clone(),
            arguments: request.arguments.clone(),
            status: ToolStatus::Success,
            payload,
        }
    }

    pub fn error(request: &ToolCallRequest, message: impl Into<String>) -> Self {
        Self {
            name: request.name.clone(),
            arguments: request.arguments.clone(),
            status: ToolStatus::Error,
            payload: Value::String(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }

    /// `TOOL_RESULT` event payload.
    pub fn event_payload(&self) -> Value {
        json!({
            "name": self.name,
            "status": self.status,
            "data": self.payload,
        })
    }

    /// Entry recorded in the history summary for this outcome.
    pub fn history_entry(&self) -> Value {
        let key = match self.status {
            ToolStatus::Success => "result",
            ToolStatus::Error => "error",
        };
        json!({
            "tool_name": self.name,
            "arguments": self.arguments,
            key: self.payload,
        })
    }
}

/// Render one turn's outcomes as the text appended to history.
pub fn outcome_summary(outcomes: &[ToolCallOutcome]) -> String {
    let entries: Vec<Value> = outcomes.iter().map(ToolCallOutcome::history_entry).collect();
    let body = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());
    format!("Executed tools with results:\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_file() -> ToolCallRequest {
        let mut args = Map::new();
        args.insert("file_path".into(), json!("a.txt"));
        ToolCallRequest::new("read_file", args)
    }

    #[test]
    fn tool_call_payload_has_name_and_arguments() {
        assert_eq!(
            read_file().event_payload().to_string(),
            r#"{"name":"read_file","arguments":{"file_path":"a.txt"}}"#
        );
    }

    #[test]
    fn error_outcome_history_entry_uses_error_key() {
        let outcome = ToolCallOutcome::error(&read_file(), "boom");
        assert_eq!(
            outcome.history_entry(),
            json!({"tool_name": "read_file", "arguments": {"file_path": "a.txt"}, "error": "boom"})
        );
        assert_eq!(
            outcome.event_payload(),
            json!({"name": "read_file", "status": "error", "data": "boom"})
        );
    }

    #[test]
    fn summary_lists_every_outcome() {
        let ok = ToolCallOutcome::success(&read_file(), json!({"type": "text", "text": "hi"}));
        let summary = outcome_summary(&[ok]);
        assert!(summary.starts_with("Executed tools with results:\n["));
        assert!(summary.contains("\"result\""));
    }

    #[test]
    fn descriptor_defaults_missing_fields() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({"name": "git_init"})).unwrap();
        assert_eq!(descriptor.description, "");
        assert_eq!(descriptor.parameters, json!({}));
    }
}
