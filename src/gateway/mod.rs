//! Tool Gateway boundary: catalog listing and tool execution.

pub mod cache;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{ToolCallRequest, ToolDescriptor};

pub use cache::CatalogCache;
pub use http::HttpToolGateway;

/// One entry of a batch response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl BatchItem {
    /// Error text, stringifying structured error bodies.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => "tool reported failure without detail".to_string(),
        }
    }
}

/// Service that lists tools and executes them on the host's behalf.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Current tool catalog.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Execute one call and return the tool's result payload.
    async fn execute(&self, call: &ToolCallRequest) -> Result<Value>;

    /// Execute several calls in one request. Items come back in request order.
    async fn execute_batch(&self, calls: &[ToolCallRequest]) -> Result<Vec<BatchItem>>;
}
