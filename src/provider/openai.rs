//! OpenAI-compatible Chat Completions streaming (OpenAI, Groq, local servers).

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::{HostError, Result};
use crate::types::{ModelMessage, TextStreamDelta};

use super::http::{bearer_headers, parse_sse_line, shared_client, status_to_error, SseLine};
use super::GenerationProvider;

pub struct OpenAiCompatibleProvider {
    provider_name: String,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        provider_name: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            provider_name: provider_name.into(),
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request_body(&self, messages: &[ModelMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_text(
        &self,
        messages: &[ModelMessage],
    ) -> Result<BoxStream<'static, Result<TextStreamDelta>>> {
        let body = self.build_request_body(messages);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            provider = %self.provider_name,
            model = %self.model,
            messages = messages.len(),
            "stream_text"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            // Bytes, not text: a UTF-8 sequence may straddle two chunks.
            let mut buffer: Vec<u8> = Vec::new();
            let mut finished = false;
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(HostError::Network(e));
                        finished = true;
                        break;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    match parse_sse_line(line) {
                        Some(SseLine::Done) => {
                            yield Ok(TextStreamDelta::done(None));
                            finished = true;
                            break 'read;
                        }
                        Some(SseLine::Data(data)) => match decode_chunk(data) {
                            Ok(Some(delta)) => {
                                let done = delta.finish_reason.is_some();
                                yield Ok(delta);
                                if done {
                                    finished = true;
                                    break 'read;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                                finished = true;
                                break 'read;
                            }
                        },
                        None => {}
                    }
                }
            }

            if !finished {
                yield Ok(TextStreamDelta::done(None));
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Decode one `data:` payload. Unparseable chunks are skipped; an in-band
/// error object ends the stream.
fn decode_chunk(data: &str) -> Result<Option<TextStreamDelta>> {
    let chunk: ChatStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "skipping unparseable stream chunk");
            return Ok(None);
        }
    };

    if let Some(error) = chunk.error {
        return Err(HostError::Stream(error.message));
    }

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    let text = choice.delta.and_then(|d| d.content).unwrap_or_default();

    match choice.finish_reason {
        Some(reason) => Ok(Some(TextStreamDelta {
            text,
            event_type: crate::types::StreamEventType::Done,
            finish_reason: Some(reason),
        })),
        None if text.is_empty() => Ok(None),
        None => Ok(Some(TextStreamDelta::text(text))),
    }
}

// Chat Completions stream types (internal)

#[derive(Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    error: Option<ChatStreamError>,
}

#[derive(Deserialize)]
struct ChatStreamChoice {
    delta: Option<ChatStreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatStreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatStreamError {
    message: String,
}
