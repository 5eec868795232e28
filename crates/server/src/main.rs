//! armory-api server entry point.
//!
//! Boots the HTTP API, the cache sweeper and the browser driver. Logs are
//! JSON on stderr.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use armory_client::{ChromiumDriver, FetchConfig, Fetcher, Scraper, ZoneExtractor};
use armory_core::cache::spawn_sweeper;
use armory_core::{AppConfig, CacheStore};
use tokio::net::TcpListener;
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

    let config = AppConfig::load()?;

    let cache = Arc::new(CacheStore::new(config.cache_ttl(), config.cache_capacity));
    let sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval());

    let fetcher = Fetcher::new(Arc::new(ChromiumDriver::new()), FetchConfig::from_config(&config));
    let scraper = Scraper::new(cache, fetcher, Arc::new(ZoneExtractor::new()));
    let app = handler::router(Arc::new(scraper));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(serverless = config.serverless, "armory-api listening on http://{addr}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    sweeper.shutdown().await;
    tracing::info!("armory-api stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("shutdown signal received, draining connections");
}
