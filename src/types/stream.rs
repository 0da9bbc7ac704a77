//! Streaming types.

use serde::{Deserialize, Serialize};

/// A delta emitted by a generation provider while streaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStreamDelta {
    /// The incremental text chunk (may be empty on the final delta).
    pub text: String,
    /// Event type.
    pub event_type: StreamEventType,
    /// Provider finish reason, only on the final delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl TextStreamDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            event_type: StreamEventType::TextDelta,
            finish_reason: None,
        }
    }

    pub fn done(finish_reason: Option<String>) -> Self {
        Self {
            text: String::new(),
            event_type: StreamEventType::Done,
            finish_reason,
        }
    }
}

/// Type of provider stream event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// Incremental text content.
    TextDelta,
    /// Stream finished.
    Done,
}
