//! HTTP trigger entry point for the stock watcher.
//!
//! Serves `GET /health` and `POST /cron/crawl` for an external scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use stockwatch::{
    config::load_config,
    pipeline::WatchCrawler,
    server::{AppState, TriggerAuth, build_app, shutdown_signal},
    storage::{LocalStorage, RecordStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("STOCKWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let config = load_config(&config_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = Arc::new(RecordStore::new(LocalStorage::new(&config.storage.data_dir)));
    let crawler = Arc::new(WatchCrawler::from_config(&config, store)?);
    let auth = TriggerAuth::new(config.server.cron_secret.as_deref());
    let app = build_app(AppState::new(crawler, auth));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(
        addr = %config.server.bind_addr,
        storage = %config.storage.data_dir.display(),
        "stockwatch server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
