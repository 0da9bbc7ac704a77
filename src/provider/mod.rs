//! Generation provider trait and the OpenAI-compatible implementation.

pub mod http;
pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::types::{ModelMessage, TextStreamDelta};

pub use openai::OpenAiCompatibleProvider;

/// A back end that streams a completion for a message history.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name (e.g., "openai", "groq").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Stream a completion. Opening failures are returned directly; faults
    /// after the first fragment arrive as `Err` items.
    async fn stream_text(
        &self,
        messages: &[ModelMessage],
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>>;
}

/// Build the provider described by `config`.
pub fn create_provider(config: &HostConfig) -> Result<Box<dyn GenerationProvider>> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| HostError::Authentication("Missing OPENAI_API_KEY".into()))?;
    let model = config
        .model
        .clone()
        .ok_or_else(|| HostError::Configuration("Missing OPENAI_MODEL".into()))?;

    Ok(Box::new(OpenAiCompatibleProvider::new(
        config.host_model.to_string(),
        model,
        api_key,
        config.resolved_base_url(),
    )))
}
