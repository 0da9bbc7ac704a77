//! Shared test helpers: a scripted generation provider and a stub gateway.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};

use mcp_host::error::{HostError, Result};
use mcp_host::gateway::{BatchItem, ToolGateway};
use mcp_host::orchestrator::{ChatSession, EventTag, StreamEvent};
use mcp_host::provider::GenerationProvider;
use mcp_host::types::{ModelMessage, TextStreamDelta, ToolCallRequest, ToolDescriptor};

/// One streamed item.
#[derive(Debug, Clone)]
pub enum Fragment {
    Text(String),
    Fault(String),
}

/// What the provider does for one generation request.
#[derive(Debug, Clone)]
pub enum Script {
    Stream(Vec<Fragment>),
    OpenFailure(String),
}

impl Script {
    pub fn text(fragments: &[&str]) -> Self {
        Self::Stream(fragments.iter().map(|f| Fragment::Text(f.to_string())).collect())
    }
}

/// A provider that replays queued scripts, then a fallback.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    requests: Mutex<Vec<Vec<ModelMessage>>>,
    pulled: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            fallback: Script::text(&["Done."]),
            requests: Mutex::new(Vec::new()),
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replay `script` for every request once the queue is empty.
    pub fn repeating(script: Script) -> Self {
        Self {
            fallback: script,
            ..Self::new()
        }
    }

    pub fn queue(&self, script: Script) -> &Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn queue_text(&self, fragments: &[&str]) -> &Self {
        self.queue(Script::text(fragments))
    }

    /// Message histories received, one per request.
    pub fn requests(&self) -> Vec<Vec<ModelMessage>> {
        self.requests.lock().unwrap().clone()
    }

    /// Fragments actually pulled from all streams so far.
    pub fn fragments_pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_text(
        &self,
        messages: &[ModelMessage],
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let fragments = match script {
            Script::OpenFailure(message) => return Err(HostError::Stream(message)),
            Script::Stream(fragments) => fragments,
        };
        let pulled = Arc::clone(&self.pulled);
        let stream = stream::iter(fragments).map(move |fragment| {
            pulled.fetch_add(1, Ordering::SeqCst);
            match fragment {
                Fragment::Text(text) => Ok(TextStreamDelta::text(text)),
                Fragment::Fault(message) => Err(HostError::Stream(message)),
            }
        });
        Ok(Box::pin(stream))
    }
}

/// In-memory gateway with canned results and optional failures.
pub struct StubGateway {
    tools: Vec<ToolDescriptor>,
    results: Mutex<HashMap<String, Value>>,
    failures_remaining: AtomicUsize,
    catalog_fails: bool,
    executed: Mutex<Vec<ToolCallRequest>>,
    batches: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            tools: vec![
                descriptor("read_file", "Read a file from the workspace"),
                descriptor("git_status", "Show the working tree status"),
            ],
            results: Mutex::new(HashMap::new()),
            failures_remaining: AtomicUsize::new(0),
            catalog_fails: false,
            executed: Mutex::new(Vec::new()),
            batches: AtomicUsize::new(0),
        }
    }

    pub fn with_result(self, tool: &str, result: Value) -> Self {
        self.results.lock().unwrap().insert(tool.to_string(), result);
        self
    }

    /// Fail the next `n` single executions.
    pub fn failing(self, n: usize) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn without_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    /// Every execution attempt, including failed ones.
    pub fn executed(&self) -> Vec<ToolCallRequest> {
        self.executed.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    fn result_for(&self, name: &str) -> Value {
        self.results
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| json!({"type": "text", "text": format!("ran {name}")}))
    }
}

#[async_trait]
impl ToolGateway for StubGateway {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        if self.catalog_fails {
            return Err(HostError::Gateway("catalog unavailable".into()));
        }
        Ok(self.tools.clone())
    }

    async fn execute(&self, call: &ToolCallRequest) -> Result<Value> {
        self.executed.lock().unwrap().push(call.clone());
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HostError::Gateway("gateway unavailable".into()));
        }
        Ok(self.result_for(&call.name))
    }

    async fn execute_batch(&self, calls: &[ToolCallRequest]) -> Result<Vec<BatchItem>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().extend(calls.iter().cloned());
        Ok(calls
            .iter()
            .map(|call| BatchItem {
                tool: Some(call.name.clone()),
                success: true,
                result: Some(self.result_for(&call.name)),
                error: None,
            })
            .collect())
    }
}

pub fn descriptor(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }
}

/// A complete envelope as a model would write it.
pub fn envelope(tool: &str, arguments: &str) -> String {
    format!(
        "<mcp_tool_call>\n  <tool_name>{tool}</tool_name>\n  <arguments>{arguments}</arguments>\n</mcp_tool_call>"
    )
}

/// Run one turn and collect every event.
pub async fn run_turn(session: &mut ChatSession, message: Option<&str>) -> Vec<StreamEvent> {
    session
        .chat(message.map(str::to_string))
        .collect::<Vec<_>>()
        .await
}

pub fn tags(events: &[StreamEvent]) -> Vec<EventTag> {
    events.iter().map(|e| e.tag).collect()
}

pub fn count(events: &[StreamEvent], tag: EventTag, payload: &str) -> usize {
    events
        .iter()
        .filter(|e| e.tag == tag && e.payload == payload)
        .count()
}
