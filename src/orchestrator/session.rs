//! The chat session: drives generation, tool dispatch and continuation.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{HostConfig, HostModel, DEFAULT_MAX_DEPTH};
use crate::dispatch::{ToolDispatcher, DEFAULT_CALL_TIMEOUT};
use crate::extract::extract_tool_calls;
use crate::gateway::CatalogCache;
use crate::history::ConversationHistory;
use crate::provider::GenerationProvider;
use crate::types::{outcome_summary, Role, ToolCallOutcome, ToolDescriptor};
use crate::util::retry::RetryPolicy;

use super::detector::{Detection, EnvelopeDetector};
use super::events::StreamEvent;
use super::prompt::build_system_prompt;

pub const TOOL_CALL_DETECTED: &str = "Tool call detected. Processing...";
pub const TOOL_PARSE_FAILED: &str = "Detected XML structure, but failed to parse valid tool calls.";
pub const CONTINUING: &str = "Tool execution finished. Asking LLM to continue...";
pub const MAX_DEPTH_REACHED: &str = "Maximum tool call depth reached. Stopping here.";

/// Per-session knobs.
#[derive(Debug, Clone, Builder)]
pub struct SessionSettings {
    /// Continuations allowed in one turn before the loop stops.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    #[builder(default)]
    pub host_model: HostModel,
    /// Deadline for each gateway attempt.
    #[builder(default = DEFAULT_CALL_TIMEOUT)]
    pub tool_timeout: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionSettings {
    pub fn from_config(config: &HostConfig) -> Self {
        Self::builder()
            .max_depth(config.max_depth)
            .host_model(config.host_model)
            .tool_timeout(config.tool_timeout())
            .retry(RetryPolicy::new(config.retry_attempts, config.retry_delay()))
            .build()
    }
}

/// One conversation. Owns its history; turns run one at a time because
/// [`ChatSession::chat`] borrows the session mutably.
pub struct ChatSession {
    id: Uuid,
    history: ConversationHistory,
    provider: Arc<dyn GenerationProvider>,
    dispatcher: ToolDispatcher,
    tools: Arc<Vec<ToolDescriptor>>,
    max_depth: usize,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools.len())
            .field("max_depth", &self.max_depth)
            .field("history", &self.history)
            .finish()
    }
}

impl ChatSession {
    /// Open a session: take the catalog snapshot (fetching it on first use)
    /// and seed the history with the system prompt.
    ///
    /// A catalog that cannot be fetched leaves the session with no tools.
    pub async fn start(
        provider: Arc<dyn GenerationProvider>,
        catalog: &CatalogCache,
        settings: SessionSettings,
    ) -> Self {
        let tools = match catalog.tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!(error = %e, "tool catalog unavailable, continuing without tools");
                Arc::new(Vec::new())
            }
        };
        let dispatcher = ToolDispatcher::new(Arc::clone(catalog.gateway()))
            .with_retry(settings.retry.clone())
            .with_call_timeout(settings.tool_timeout);
        Self::new(provider, dispatcher, tools, &settings)
    }

    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        dispatcher: ToolDispatcher,
        tools: Arc<Vec<ToolDescriptor>>,
        settings: &SessionSettings,
    ) -> Self {
        let history =
            ConversationHistory::for_model(build_system_prompt(&tools), settings.host_model);
        Self {
            id: Uuid::new_v4(),
            history,
            provider,
            dispatcher,
            tools,
            max_depth: settings.max_depth,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Run one turn. `None`, or a message that is only whitespace, continues
    /// from the current history without new user input.
    ///
    /// The returned stream always finishes with a single `STREAM_END`.
    /// Dropping it cancels the turn at its next suspension point.
    pub fn chat(&mut self, user_message: Option<String>) -> BoxStream<'_, StreamEvent> {
        let stream = async_stream::stream! {
            if let Some(message) = user_message.filter(|m| !m.trim().is_empty()) {
                self.history.append(Role::User, message, false);
            }

            let mut depth = 0usize;
            loop {
                if depth >= self.max_depth {
                    debug!(session = %self.id, depth, "depth bound reached");
                    yield StreamEvent::system(MAX_DEPTH_REACHED);
                    break;
                }
                debug!(session = %self.id, depth, messages = self.history.len(), "generating");

                let mut detector = EnvelopeDetector::new();
                let mut fault = None;
                match self.provider.stream_text(self.history.messages()).await {
                    Err(e) => fault = Some(e),
                    Ok(mut deltas) => {
                        while let Some(item) = deltas.next().await {
                            let delta = match item {
                                Ok(delta) => delta,
                                Err(e) => {
                                    fault = Some(e);
                                    break;
                                }
                            };
                            match detector.push(&delta.text) {
                                Detection::Narration(text) => yield StreamEvent::llm(text),
                                Detection::Envelope { raw } => {
                                    yield StreamEvent::system(TOOL_CALL_DETECTED);
                                    if let Some(raw) = raw {
                                        yield StreamEvent::raw_tool_call(raw);
                                    }
                                    break;
                                }
                                Detection::Ignored => {}
                            }
                        }
                    }
                }

                if let Some(e) = fault {
                    warn!(session = %self.id, error = %e, "generation stream failed");
                    let note = format!("Error during LLM stream: {e}");
                    yield StreamEvent::error(note.clone());
                    self.history.append(Role::Assistant, note, true);
                    break;
                }

                let envelope_found = detector.envelope_found();
                let segment = detector.into_buffer();
                if !segment.is_empty() {
                    self.history.append(Role::Assistant, segment.as_str(), envelope_found);
                }
                if !envelope_found {
                    break;
                }

                let calls = extract_tool_calls(&segment);
                if calls.is_empty() {
                    yield StreamEvent::error(TOOL_PARSE_FAILED);
                    break;
                }

                let mut outcomes: Vec<ToolCallOutcome> = Vec::with_capacity(calls.len());
                if calls.len() > 1 {
                    let results = self.dispatcher.execute_batch(&calls).await;
                    for (call, outcome) in calls.iter().zip(results) {
                        yield StreamEvent::tool_call(call);
                        yield StreamEvent::tool_result(&outcome);
                        outcomes.push(outcome);
                    }
                } else {
                    for call in &calls {
                        yield StreamEvent::tool_call(call);
                        let outcome = self.dispatcher.execute_one(call).await;
                        yield StreamEvent::tool_result(&outcome);
                        outcomes.push(outcome);
                    }
                }

                self.history.append(Role::Assistant, outcome_summary(&outcomes), true);
                yield StreamEvent::system(CONTINUING);
                depth += 1;
            }

            yield StreamEvent::stream_end();
        };
        Box::pin(stream)
    }
}
