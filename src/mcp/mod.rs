// file: src/mcp/mod.rs
// description: MCP (Model Context Protocol) server for agentic tool integration
// reference: https://docs.rs/rmcp

pub mod rate_limit;
pub mod server;

pub use rate_limit::FixedWindowLimiter;
pub use server::CodeSummarizerMcp;

use crate::config::{Config, ConfigStore};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use std::path::PathBuf;
use tracing::info;

/// Serve over stdio until the client disconnects.
pub async fn serve_stdio(store: ConfigStore, config: Config, workdir: PathBuf) -> anyhow::Result<()> {
    info!("Starting code summarizer MCP server on stdio");

    let service = CodeSummarizerMcp::new(store, config, workdir);
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    info!("MCP server stopped");
    Ok(())
}
