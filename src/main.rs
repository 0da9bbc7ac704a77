//! mcp-host binary entry point.

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mcp_host::cli::{render_catalog, render_event, render_history, Cli, Commands, ReplCommand};
use mcp_host::config::HostConfig;
use mcp_host::error::HostError;
use mcp_host::gateway::{CatalogCache, HttpToolGateway, ToolGateway};
use mcp_host::orchestrator::{ChatSession, SessionSettings};
use mcp_host::provider::create_provider;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), HostError> {
    let config = cli.connection.apply(HostConfig::load(cli.config.as_deref())?);
    tracing::debug!(?config, "resolved configuration");

    let gateway: Arc<dyn ToolGateway> = Arc::new(HttpToolGateway::new(&config.gateway_url));
    let catalog = CatalogCache::new(gateway);

    match cli.command {
        Some(Commands::Tools) => {
            let tools = catalog.tools().await?;
            render_catalog(&tools, &mut std::io::stdout())?;
            Ok(())
        }
        None => chat(config, catalog, cli.prompt).await,
    }
}

async fn chat(config: HostConfig, catalog: CatalogCache, prompt: Option<String>) -> Result<(), HostError> {
    config.validate()?;
    let provider = Arc::from(create_provider(&config)?);
    let mut session =
        ChatSession::start(provider, &catalog, SessionSettings::from_config(&config)).await;

    if let Some(prompt) = prompt {
        return run_turn(&mut session, prompt).await;
    }

    eprintln!(
        "Connected to {} with {} tools. Commands: tools, history, exit.",
        config.gateway_url,
        session.tools().len()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ReplCommand::parse(line) {
            Some(ReplCommand::Exit) => break,
            Some(ReplCommand::Tools) => render_catalog(session.tools(), &mut std::io::stdout())?,
            Some(ReplCommand::History) => {
                render_history(session.history().messages(), &mut std::io::stdout())?
            }
            None => run_turn(&mut session, line.to_string()).await?,
        }
    }
    Ok(())
}

async fn run_turn(session: &mut ChatSession, message: String) -> Result<(), HostError> {
    let mut events = session.chat(Some(message));
    let mut out = std::io::stdout();
    let mut diag = std::io::stderr();
    while let Some(event) = events.next().await {
        render_event(&event, &mut out, &mut diag)?;
    }
    Ok(())
}
