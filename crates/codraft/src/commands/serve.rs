//! Serve command: run the MCP server on stdio.

use anyhow::Context;
use clap::Args;
use codraft_core::{Drafts, FileStore};
use rmcp::ServiceExt;
use tracing::{info, instrument};

use crate::server::DraftServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

/// Serve draft tools over stdio until the client disconnects.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    _args: ServeArgs,
    drafts: Drafts<FileStore>,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    info!(data_dir = %drafts.store().dir(), "starting MCP server on stdio");

    let service = DraftServer::new(drafts, max_input)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| anyhow::anyhow!("failed to start MCP server: {e}"))?;
    let reason = service
        .waiting()
        .await
        .context("MCP server terminated abnormally")?;

    info!(?reason, "MCP server stopped");
    Ok(())
}
