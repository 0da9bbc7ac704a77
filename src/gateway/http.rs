//! HTTP client for the Tool Gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::{HostError, Result};
use crate::provider::http::shared_client;
use crate::types::{ToolCallRequest, ToolDescriptor};

use super::{BatchItem, ToolGateway};

#[derive(Debug, Serialize)]
struct ExecuteBody<'a> {
    tool: &'a str,
    input: &'a Map<String, Value>,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    result: Option<Value>,
}

/// Gateway reached over HTTP. Every request carries this client's id.
#[derive(Debug, Clone)]
pub struct HttpToolGateway {
    base_url: String,
    client_id: Uuid,
}

impl HttpToolGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: Uuid::new_v4(),
        }
    }

    pub fn with_client_id(mut self, client_id: Uuid) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn execute_body<'a>(&self, call: &'a ToolCallRequest) -> ExecuteBody<'a> {
        ExecuteBody {
            tool: &call.name,
            input: &call.arguments,
            client_id: self.client_id.to_string(),
        }
    }
}

async fn failure(context: &str, resp: reqwest::Response) -> HostError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    HostError::Gateway(format!("{context} failed with status {status}: {body}"))
}

#[async_trait]
impl ToolGateway for HttpToolGateway {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let url = format!("{}/tools", self.base_url);
        debug!(%url, client_id = %self.client_id, "fetching tool catalog");

        let resp = shared_client()
            .get(&url)
            .query(&[("client_id", self.client_id.to_string())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(failure("Tool listing", resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn execute(&self, call: &ToolCallRequest) -> Result<Value> {
        let url = format!("{}/execute", self.base_url);
        debug!(tool = %call.name, "executing tool");

        let resp = shared_client()
            .post(&url)
            .json(&self.execute_body(call))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(failure("Tool execution", resp).await);
        }
        let body: ExecuteResponse = resp.json().await?;
        Ok(body.result.unwrap_or_else(|| Value::Object(Map::new())))
    }

    async fn execute_batch(&self, calls: &[ToolCallRequest]) -> Result<Vec<BatchItem>> {
        let url = format!("{}/batch-execute", self.base_url);
        debug!(count = calls.len(), "executing tool batch");

        let bodies: Vec<ExecuteBody<'_>> = calls.iter().map(|c| self.execute_body(c)).collect();
        let resp = shared_client().post(&url).json(&bodies).send().await?;
        if !resp.status().is_success() {
            return Err(failure("Batch execution", resp).await);
        }
        Ok(resp.json().await?)
    }
}
