//! Tagged events emitted to the front end, wire-encoded as `[TAG]payload`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::types::{ToolCallOutcome, ToolCallRequest};

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventTag {
    /// Model narration fragment.
    Llm,
    /// Orchestrator progress note.
    System,
    /// Turn-ending fault.
    Error,
    /// Verbatim tool-call envelope as the model wrote it.
    RawToolCall,
    /// JSON `{"name","arguments"}`.
    ToolCall,
    /// JSON `{"name","status","data"}`.
    ToolResult,
    /// Last event of every turn; no payload.
    StreamEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub tag: EventTag,
    pub payload: String,
}

impl StreamEvent {
    pub fn new(tag: EventTag, payload: impl Into<String>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    pub fn llm(text: impl Into<String>) -> Self {
        Self::new(EventTag::Llm, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(EventTag::System, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EventTag::Error, text)
    }

    pub fn raw_tool_call(envelope: impl Into<String>) -> Self {
        Self::new(EventTag::RawToolCall, envelope)
    }

    pub fn tool_call(call: &ToolCallRequest) -> Self {
        Self::new(EventTag::ToolCall, call.event_payload().to_string())
    }

    pub fn tool_result(outcome: &ToolCallOutcome) -> Self {
        Self::new(EventTag::ToolResult, outcome.event_payload().to_string())
    }

    pub fn stream_end() -> Self {
        Self::new(EventTag::StreamEnd, "")
    }

    /// `[TAG]payload`
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a `[TAG]payload` frame. Unknown tags and malformed frames yield `None`.
    pub fn decode(frame: &str) -> Option<Self> {
        let rest = frame.strip_prefix('[')?;
        let close = rest.find(']')?;
        let tag = rest[..close].parse::<EventTag>().ok()?;
        Some(Self::new(tag, &rest[close + 1..]))
    }

    /// Payload parsed as JSON, for `TOOL_CALL` and `TOOL_RESULT`.
    pub fn json_payload(&self) -> Option<Value> {
        match self.tag {
            EventTag::ToolCall | EventTag::ToolResult => serde_json::from_str(&self.payload).ok(),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.tag == EventTag::StreamEnd
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.tag, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    #[test]
    fn tags_render_in_wire_form() {
        assert_eq!(EventTag::Llm.to_string(), "LLM");
        assert_eq!(EventTag::RawToolCall.to_string(), "RAW_TOOL_CALL");
        assert_eq!(StreamEvent::stream_end().encode(), "[STREAM_END]");
        assert_eq!(StreamEvent::llm("Hello").encode(), "[LLM]Hello");
    }

    #[test]
    fn tool_call_frame_carries_json() {
        let mut args = Map::new();
        args.insert("file_path".into(), json!("a.txt"));
        let event = StreamEvent::tool_call(&ToolCallRequest::new("read_file", args));
        assert_eq!(
            event.encode(),
            r#"[TOOL_CALL]{"name":"read_file","arguments":{"file_path":"a.txt"}}"#
        );
        assert_eq!(
            event.json_payload(),
            Some(json!({"name": "read_file", "arguments": {"file_path": "a.txt"}}))
        );
    }

    #[test]
    fn decode_frames() {
        assert_eq!(
            StreamEvent::decode("[SYSTEM]Tool call detected. Processing..."),
            Some(StreamEvent::system("Tool call detected. Processing..."))
        );
        // Payload may itself contain brackets.
        assert_eq!(
            StreamEvent::decode("[LLM][x] done"),
            Some(StreamEvent::llm("[x] done"))
        );
        assert_eq!(StreamEvent::decode("[STREAM_END]"), Some(StreamEvent::stream_end()));
        assert_eq!(StreamEvent::decode("[NOPE]x"), None);
        assert_eq!(StreamEvent::decode("LLM]x"), None);
    }
}
