//! Error types for the host.

use thiserror::Error;

/// Primary error type for all host operations.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Gateway error: {0}")]
    Gateway(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Gateway,
    Stream,
}

impl HostError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Io(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::ConfigFile(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Gateway(_) => ErrorCategory::Gateway,
            Self::Stream(_) => ErrorCategory::Stream,
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Gateway calls are retried regardless; this only feeds retry logs.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = HostError::api(404, "Tool 'nope' not found.");
        assert_eq!(
            err.to_string(),
            "API error (status 404): Tool 'nope' not found."
        );
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(!err.is_transient());
    }

    #[test]
    fn server_and_timeout_errors_are_transient() {
        assert!(HostError::api(503, "unavailable").is_transient());
        assert!(HostError::Timeout(1000).is_transient());
        assert!(HostError::RateLimited { retry_after_ms: None }.is_transient());
        assert!(!HostError::Authentication("bad key".into()).is_transient());
    }

    #[test]
    fn gateway_and_stream_errors_keep_their_categories() {
        let err = HostError::Gateway("execute failed with status 404: nope".into());
        assert_eq!(err.category(), ErrorCategory::Gateway);
        assert!(!err.is_transient());
        assert_eq!(
            HostError::Stream("cut".into()).category(),
            ErrorCategory::Stream
        );
    }

    #[test]
    fn auth_statuses_map_to_authentication() {
        assert_eq!(
            HostError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            HostError::api(403, "nope").category(),
            ErrorCategory::Authentication
        );
    }
}
