//! Terminal front end: arguments and event rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{HostConfig, HostModel};
use crate::orchestrator::{EventTag, StreamEvent};
use crate::types::{ModelMessage, ToolDescriptor};

const RESULT_PREVIEW_CHARS: usize = 200;
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Commands understood inside the interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Tools,
    History,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "exit" | "quit" => Some(Self::Exit),
            "tools" => Some(Self::Tools),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// Chat with a language model that drives tools through an MCP gateway.
#[derive(Parser, Debug)]
#[command(name = "mcp-host", version, about)]
pub struct Cli {
    /// TOML config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Send one message, print the reply and exit
    #[arg(short, long)]
    pub prompt: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the tools advertised by the gateway
    Tools,
}

/// Overrides for config values; unset flags keep the loaded value.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(short, long)]
    pub model: Option<String>,

    /// Back-end family: openai or groq
    #[arg(long)]
    pub host_model: Option<HostModel>,

    /// Tool gateway URL
    #[arg(long)]
    pub mcp_url: Option<String>,

    /// Tool-call continuations allowed per turn
    #[arg(long)]
    pub max_depth: Option<usize>,
}

impl ConnectionArgs {
    pub fn apply(&self, mut config: HostConfig) -> HostConfig {
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(host_model) = self.host_model {
            config = config.with_host_model(host_model);
        }
        if let Some(url) = &self.mcp_url {
            config = config.with_gateway_url(url);
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_depth(depth);
        }
        config
    }
}

/// Write one event: model text to `out`, everything else to `diag`.
pub fn render_event(event: &StreamEvent, out: &mut impl Write, diag: &mut impl Write) -> io::Result<()> {
    match event.tag {
        EventTag::Llm => {
            write!(out, "{}", event.payload)?;
            out.flush()?;
        }
        EventTag::System => writeln!(diag, "\n· {}", event.payload)?,
        EventTag::Error => writeln!(diag, "\n✗ {}", event.payload)?,
        EventTag::RawToolCall => {}
        EventTag::ToolCall => {
            let payload = event.json_payload().unwrap_or_default();
            let name = payload["name"].as_str().unwrap_or("?");
            let arguments = serde_json::to_string_pretty(&payload["arguments"])
                .unwrap_or_else(|_| payload["arguments"].to_string());
            writeln!(diag, "⚡ {name}\n{arguments}")?;
        }
        EventTag::ToolResult => {
            let payload = event.json_payload().unwrap_or_default();
            let data = match &payload["data"] {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let marker = if payload["status"] == "error" { "❌" } else { "✅" };
            writeln!(diag, "  {marker} {}", preview(&data))?;
        }
        EventTag::StreamEnd => {
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Catalog listing for the `tools` command.
pub fn render_catalog(tools: &[ToolDescriptor], out: &mut impl Write) -> io::Result<()> {
    if tools.is_empty() {
        return writeln!(out, "No tools available.");
    }
    for tool in tools {
        writeln!(out, "{:<24} {}", tool.name, tool.description)?;
    }
    Ok(())
}

/// One line per message: role and the start of its text.
pub fn render_history(messages: &[ModelMessage], out: &mut impl Write) -> io::Result<()> {
    for (i, message) in messages.iter().enumerate() {
        let text = message.text().replace('\n', " ");
        writeln!(
            out,
            "{:>3} {:<9} {}",
            i,
            message.role.to_string(),
            truncate(&text, HISTORY_PREVIEW_CHARS)
        )?;
    }
    Ok(())
}

fn preview(text: &str) -> String {
    truncate(text, RESULT_PREVIEW_CHARS)
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
