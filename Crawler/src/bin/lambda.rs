//! AWS Lambda entry point for the stock watcher.
//!
//! Deploy with `cargo lambda build --release --features lambda` and trigger
//! it from an EventBridge schedule.
//!
//! ## Environment Variables
//!
//! - `S3_BUCKET`: bucket holding watches and history (default: `stockwatch`)
//! - `S3_PREFIX`: key prefix (default: `stockwatch`)
//! - `CONFIG_S3_KEY`: config key under the prefix (default: `config.toml`)
//! - `LINE_CHANNEL_ACCESS_TOKEN`: push API token
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("stockwatch Lambda starting...");
    lambda_runtime::run(service_fn(stockwatch::lambda::handler)).await
}
