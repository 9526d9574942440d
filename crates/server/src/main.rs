//! shellcache server entry point.
//!
//! Boots one worker generation for the configured origin and build manifest
//! and exposes it as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchConfig, HttpNetwork};
use shellcache_core::{AppConfig, BuildManifest, CacheDb, Namespaces};
use shellcache_worker::{ServiceWorker, WorkerContext};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin()?;

    let manifest = BuildManifest::load(&config.manifest_path)
        .await
        .with_context(|| format!("loading build manifest {}", config.manifest_path.display()))?;
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;

    tracing::info!(
        origin = %origin,
        resources = manifest.resources.len(),
        core = manifest.core.len(),
        "Starting shellcache server on stdio transport"
    );

    let worker = ServiceWorker::new(WorkerContext {
        manifest: Arc::new(manifest),
        origin,
        namespaces: Namespaces::new(Arc::new(db), config.namespace_names()),
        network: Arc::new(network),
    });

    let handler = handler::ShellCacheServer::new(Arc::new(worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
