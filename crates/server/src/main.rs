//! folio-sw server entry point.
//!
//! Boots the offline router behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use folio_client::{FetchConfig, HttpNetwork, RouterConfig};
use folio_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let router_config = RouterConfig::from_app_config(&config).context("building router configuration")?;

    let cache = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database at {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;

    tracing::info!(
        cache = %router_config.cache_name(),
        origin = %router_config.origin,
        db = %config.db_path.display(),
        "Starting folio-sw server on stdio transport"
    );

    let host = tools::WorkerHost::new(router_config, cache, Arc::new(network));
    let handler = handler::FolioServer::new(host);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
