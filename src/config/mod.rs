//! Configuration (layered: defaults < TOML file < env < explicit setters).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{HostError, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8001";
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// Back-end family. Selects the history layout and the default base URL.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HostModel {
    #[default]
    OpenAi,
    Groq,
}

impl HostModel {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Self::Groq => DEFAULT_GROQ_BASE_URL,
        }
    }
}

/// Host settings. TOML files use the field names below.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub host_model: HostModel,
    pub gateway_url: String,
    pub max_depth: usize,
    pub tool_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("host_model", &self.host_model)
            .field("gateway_url", &self.gateway_url)
            .field("max_depth", &self.max_depth)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            host_model: HostModel::default(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            tool_timeout_secs: 60,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| HostError::Configuration(format!("{key} has an invalid value: {raw}")))
}

impl HostConfig {
    /// Defaults overlaid with the environment (a `.env` file is loaded if present).
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Resolve the full layer stack: defaults, then `path` (or the default
    /// config file when it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_toml_file(&path)?,
                _ => Self::default(),
            },
        };
        base.with_env()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading config file");
        Self::from_toml_str(&raw)
    }

    /// Overlay environment variables onto `self`.
    pub fn with_env(mut self) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        if let Some(key) = env_value("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = env_value("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        // OPENAI_MODEL wins over the older MODEL_NAME spelling.
        if let Some(model) = env_value("OPENAI_MODEL").or_else(|| env_value("MODEL_NAME")) {
            self.model = Some(model);
        }
        if let Some(raw) = env_value("HOST_MODEL") {
            self.host_model = parse_env("HOST_MODEL", &raw)?;
        }
        if let Some(url) = env_value("MCP_CLIENT_URL") {
            self.gateway_url = url;
        }
        if let Some(raw) = env_value("MCP_MAX_DEPTH") {
            self.max_depth = parse_env("MCP_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = env_value("MCP_TOOL_TIMEOUT_SECS") {
            self.tool_timeout_secs = parse_env("MCP_TOOL_TIMEOUT_SECS", &raw)?;
        }
        Ok(self)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_host_model(mut self, host_model: HostModel) -> Self {
        self.host_model = host_model;
        self
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Explicit base URL, or the back-end family's default.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.host_model.default_base_url())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Check that everything needed to open a session is present.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(HostError::Configuration(
                "missing API key (set OPENAI_API_KEY or --api-key)".into(),
            ));
        }
        if self.model.as_deref().map_or(true, str::is_empty) {
            return Err(HostError::Configuration(
                "missing model name (set OPENAI_MODEL or --model)".into(),
            ));
        }
        if self.gateway_url.trim().is_empty() {
            return Err(HostError::Configuration("missing gateway URL".into()));
        }
        if self.tool_timeout_secs == 0 {
            return Err(HostError::Configuration(
                "tool_timeout_secs must be at least 1".into(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(HostError::Configuration(
                "retry_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/mcp-host/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mcp-host")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
