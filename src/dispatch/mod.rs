//! Tool dispatch: gateway calls with retry, deadlines and per-call error
//! isolation. Every call yields a [`ToolCallOutcome`]; faults never escape.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::gateway::{BatchItem, ToolGateway};
use crate::types::{ToolCallOutcome, ToolCallRequest};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Executes tool calls against a gateway.
#[derive(Clone)]
pub struct ToolDispatcher {
    gateway: Arc<dyn ToolGateway>,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("retry", &self.retry)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl ToolDispatcher {
    pub fn new(gateway: Arc<dyn ToolGateway>) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deadline for each individual attempt.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Run one call, retrying transport faults, error statuses and timeouts.
    ///
    /// A result object carrying an `error` key is the tool reporting failure;
    /// it becomes an error outcome without a retry.
    pub async fn execute_one(&self, call: &ToolCallRequest) -> ToolCallOutcome {
        let result = self
            .retry
            .execute(&call.name, || {
                with_timeout(self.call_timeout, self.gateway.execute(call))
            })
            .await;

        match result {
            Ok(payload) => classify(call, payload),
            Err(e) => ToolCallOutcome::error(call, e.to_string()),
        }
    }

    /// Run several calls in one gateway request, without retry.
    ///
    /// Outcomes follow request order. A gateway-level failure turns every call
    /// into an error outcome; a missing response entry does the same for its
    /// call.
    pub async fn execute_batch(&self, calls: &[ToolCallRequest]) -> Vec<ToolCallOutcome> {
        let items = match self.gateway.execute_batch(calls).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, count = calls.len(), "batch execution failed");
                let message = format!("Batch execution failed: {e}");
                return calls
                    .iter()
                    .map(|call| ToolCallOutcome::error(call, message.clone()))
                    .collect();
            }
        };

        if items.len() != calls.len() {
            tracing::warn!(
                expected = calls.len(),
                received = items.len(),
                "batch response length mismatch"
            );
        }

        calls
            .iter()
            .enumerate()
            .map(|(i, call)| match items.get(i) {
                Some(item) => batch_outcome(call, item),
                None => ToolCallOutcome::error(call, "No result returned for this call"),
            })
            .collect()
    }
}

fn classify(call: &ToolCallRequest, payload: Value) -> ToolCallOutcome {
    match payload.get("error") {
        Some(error) if payload.is_object() => ToolCallOutcome::error(call, error_text(error)),
        _ => ToolCallOutcome::success(call, payload),
    }
}

fn batch_outcome(call: &ToolCallRequest, item: &BatchItem) -> ToolCallOutcome {
    if item.success {
        classify(call, item.result.clone().unwrap_or(Value::Null))
    } else {
        ToolCallOutcome::error(call, item.error_message())
    }
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn call(name: &str) -> ToolCallRequest {
        ToolCallRequest::new(name, Map::new())
    }

    #[test]
    fn error_key_in_object_is_an_error_outcome() {
        let outcome = classify(&call("x"), json!({"error": "disk full"}));
        assert!(outcome.is_error());
        assert_eq!(outcome.payload, json!("disk full"));

        let outcome = classify(&call("x"), json!({"type": "text", "text": "ok"}));
        assert!(!outcome.is_error());

        // A bare string mentioning "error" is still a result.
        let outcome = classify(&call("x"), json!("error: none"));
        assert!(!outcome.is_error());
    }

    #[test]
    fn failed_batch_item_uses_its_error() {
        let item = BatchItem {
            tool: Some("x".into()),
            success: false,
            result: None,
            error: Some(json!("Tool 'x' not found.")),
        };
        let outcome = batch_outcome(&call("x"), &item);
        assert!(outcome.is_error());
        assert_eq!(outcome.payload, json!("Tool 'x' not found."));
    }
}
