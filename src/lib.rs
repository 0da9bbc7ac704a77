//! mcp-host: a streaming chat host that lets a language model drive tools.
//!
//! The model writes tool calls inline as `<mcp_tool_call>` envelopes. A
//! [`orchestrator::ChatSession`] watches the token stream, cuts generation
//! when an envelope completes, runs the call through a Tool Gateway, feeds
//! the result back and lets the model continue. Front ends consume the turn
//! as tagged [`orchestrator::StreamEvent`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use mcp_host::prelude::*;
//!
//! # async fn example() -> mcp_host::error::Result<()> {
//! let config = HostConfig::from_env()?;
//! config.validate()?;
//!
//! let catalog = CatalogCache::new(Arc::new(HttpToolGateway::new(&config.gateway_url)));
//! let provider = Arc::from(create_provider(&config)?);
//! let mut session =
//!     ChatSession::start(provider, &catalog, SessionSettings::from_config(&config)).await;
//!
//! let mut events = session.chat(Some("List the files in the project".into()));
//! while let Some(event) = events.next().await {
//!     println!("{}", event.encode());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod history;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
