//! OpenAI-compatible streaming provider against a mock SSE server.

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mcp_host::error::HostError;
use mcp_host::history::ConversationHistory;
use mcp_host::config::HostModel;
use mcp_host::provider::{GenerationProvider, OpenAiCompatibleProvider};
use mcp_host::types::{Role, StreamEventType, TextStreamDelta};

fn sse(chunks: &[&str]) -> String {
    chunks.iter().map(|c| format!("data: {c}\n\n")).collect()
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

async fn collect(
    provider: &OpenAiCompatibleProvider,
    history: &ConversationHistory,
) -> Vec<Result<TextStreamDelta, HostError>> {
    provider
        .stream_text(history.messages())
        .await
        .expect("stream should open")
        .collect()
        .await
}

fn history() -> ConversationHistory {
    let mut history = ConversationHistory::for_model("You are a tool user.", HostModel::OpenAi);
    history.append(Role::User, "hi", false);
    history.append(Role::Assistant, "calling", true);
    history
}

#[tokio::test]
async fn streams_text_deltas_until_done() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        r#"{"choices":[{"delta":{"content":"lo"},"finish_reason":null}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "[DONE]",
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": true,
            "messages": [
                {"role": "system", "content": "You are a tool user."},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": [{"type": "text", "text": "calling"}]}
            ]
        })))
        .respond_with(sse_response(body))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(
        "openai",
        "gpt-4o-mini",
        "test-key",
        format!("{}/v1/", server.uri()),
    );
    let deltas = collect(&provider, &history()).await;

    let texts: Vec<String> = deltas
        .iter()
        .map(|d| d.as_ref().unwrap().text.clone())
        .collect();
    assert_eq!(texts, vec!["Hel", "lo", ""]);
    let last = deltas.last().unwrap().as_ref().unwrap();
    assert_eq!(last.event_type, StreamEventType::Done);
    assert_eq!(last.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn stream_without_finish_reason_still_ends_with_done() {
    let server = MockServer::start().await;
    let body = sse(&[r#"{"choices":[{"delta":{"content":"ok"}}]}"#]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new("groq", "llama", "k", server.uri());
    let deltas = collect(&provider, &history()).await;

    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0].as_ref().unwrap().text, "ok");
    assert_eq!(
        deltas[1].as_ref().unwrap().event_type,
        StreamEventType::Done
    );
}

#[tokio::test]
async fn in_band_error_ends_stream_with_error() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"choices":[{"delta":{"content":"par"}}]}"#,
        r#"{"error":{"message":"model overloaded"}}"#,
        r#"{"choices":[{"delta":{"content":"never"}}]}"#,
    ]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "m", "k", server.uri());
    let deltas = collect(&provider, &history()).await;

    assert_eq!(deltas.len(), 2);
    assert!(matches!(&deltas[1], Err(HostError::Stream(m)) if m == "model overloaded"));
}

#[tokio::test]
async fn error_status_fails_to_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "m", "bad", server.uri());
    let err = match provider.stream_text(history().messages()).await {
        Ok(_) => panic!("expected open failure"),
        Err(err) => err,
    };
    assert!(matches!(err, HostError::Authentication(ref m) if m == "invalid api key"));
}
