//! swcache host entry point.
//!
//! Boots the offline cache router in front of the configured origin: the
//! worker is installed and activated, then every request to the listen
//! address goes through it. Logging goes to stderr as JSON.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use swcache_client::{FetchConfig, OriginClient, canonicalize_origin};
use swcache_core::{AppConfig, CacheDb, CacheStore, MemoryStore, Network, OfflineWorker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let mut config = AppConfig::load()?;
    config.origin = canonicalize_origin(&config.origin)?.to_string();

    let store: Arc<dyn CacheStore> = if config.db_path == Path::new(":memory:") {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };

    let origin: Arc<dyn Network> = Arc::new(OriginClient::new(FetchConfig::from(&config))?);
    let worker = Arc::new(OfflineWorker::new(&config, store, Arc::clone(&origin))?);

    let installed = worker.install().await?;
    for failure in &installed.failed {
        tracing::warn!(path = %failure.path, reason = %failure.reason, "entry left out of pre-cache");
    }
    let activated = worker.activate().await?;
    tracing::info!(
        cached = installed.cached.len(),
        failed = installed.failed.len(),
        deleted = ?activated.deleted,
        "worker ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, origin = %config.origin, "starting swcache");

    let state = handler::AppState::new(Arc::clone(&worker), origin, config.max_bytes);
    axum::serve(listener, handler::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker.settle().await;
    tracing::info!("stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down, waiting for pending cache writes");
}
