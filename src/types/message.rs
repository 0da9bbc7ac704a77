//! Message types for model communication.
//!
//! Messages serialize directly into the OpenAI chat-completions shape, so the
//! history can be sent to a provider without a conversion pass.

use serde::{Deserialize, Serialize};
use strum::Display;

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ModelMessage {
    /// Create a plain-text message with the given role.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message whose content is a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Parts(vec![ContentPart::text(text)]),
        }
    }

    /// Extract the text content, concatenating all text parts.
    pub fn text(&self) -> String {
        self.content.text()
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message content: either one string or an ordered list of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text.as_str(),
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Append a part, promoting plain text content to a part list first.
    pub fn push_part(&mut self, part: ContentPart) {
        match self {
            Self::Parts(parts) => parts.push(part),
            Self::Text(text) => {
                let existing = ContentPart::text(std::mem::take(text));
                *self = Self::Parts(vec![existing, part]);
            }
        }
    }

    /// Number of parts (plain text counts as one).
    pub fn part_count(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Parts(parts) => parts.len(),
        }
    }
}

/// A single part of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}
