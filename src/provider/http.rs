//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::HostError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: completions stream for as long as the model
/// talks, and tool calls are bounded by the dispatcher.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// One meaningful SSE line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    Data(&'a str),
    Done,
}

/// Parse an SSE line. Comments, blank lines and non-data fields yield `None`.
pub fn parse_sse_line(line: &str) -> Option<SseLine<'_>> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(SseLine::Done);
    }
    Some(SseLine::Data(data))
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> HostError {
    match status {
        401 | 403 => HostError::Authentication(body.to_string()),
        429 => HostError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => HostError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_lines() {
        assert_eq!(parse_sse_line("data: {\"a\":1}"), Some(SseLine::Data("{\"a\":1}")));
        assert_eq!(parse_sse_line("data:{}"), Some(SseLine::Data("{}")));
        assert_eq!(parse_sse_line("data: [DONE]"), Some(SseLine::Done));
        assert_eq!(parse_sse_line("event: ping"), None);
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = status_to_error(429, r#"{"error":{"retry_after":1.5}}"#);
        assert!(matches!(err, HostError::RateLimited { retry_after_ms: Some(1500) }));
        assert!(matches!(status_to_error(401, "no"), HostError::Authentication(_)));
        assert!(matches!(status_to_error(500, "x"), HostError::Api { status: 500, .. }));
    }
}
