//! Serve command - runs the MCP server on stdin/stdout until the client
//! disconnects or Ctrl-C is received.

use anyhow::Result;
use gcpmcp_core::ToolExecutor;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FileConfig;
use crate::mcp::McpServer;

pub async fn execute(config: &FileConfig) -> Result<()> {
    let executor = super::build_executor(config)?;
    info!(tools = executor.list_tools().len(), "Starting MCP server on stdio");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
        signal.cancel();
    });

    let server = Arc::new(McpServer::new(executor, shutdown));
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("MCP server stopped");
    Ok(())
}
