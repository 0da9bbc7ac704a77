//! Convenience re-exports for common use.

pub use crate::config::{HostConfig, HostModel};
pub use crate::dispatch::ToolDispatcher;
pub use crate::error::{HostError, Result};
pub use crate::gateway::{CatalogCache, HttpToolGateway, ToolGateway};
pub use crate::history::ConversationHistory;
pub use crate::orchestrator::{ChatSession, EventTag, SessionSettings, StreamEvent};
pub use crate::provider::{create_provider, GenerationProvider, OpenAiCompatibleProvider};
pub use crate::types::{
    ContentPart, MessageContent, ModelMessage, Role, TextStreamDelta, ToolCallOutcome,
    ToolCallRequest, ToolDescriptor, ToolStatus,
};
