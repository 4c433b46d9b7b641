// src/lambda/mod.rs

//! AWS Lambda handler for the stock watcher.
//!
//! Invoked on a schedule, the function:
//! 1. Loads `config.toml` from the bucket (defaults when absent)
//! 2. Runs one crawl pass over the watches stored in S3
//! 3. Reports the pass summary

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::RemoteConfigLoader;
use crate::error::Result;
use crate::pipeline::{PassSummary, WatchCrawler};
use crate::storage::{RecordStore, S3Storage};

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct CrawlResponse {
    /// Whether the pass ran to completion
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PassSummary>,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl CrawlResponse {
    fn finished(result: Result<PassSummary>, elapsed_ms: u64) -> Self {
        match result {
            Ok(summary) => Self {
                success: true,
                summary: Some(summary),
                error: None,
                execution_time_ms: elapsed_ms,
            },
            Err(e) => Self {
                success: false,
                summary: None,
                error: Some(e.to_string()),
                execution_time_ms: elapsed_ms,
            },
        }
    }
}

/// Main Lambda handler function.
///
/// The scheduler's event payload is ignored.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<CrawlResponse, LambdaError> {
    let start = std::time::Instant::now();
    info!(request_id = %event.context.request_id, "Starting crawl pass");

    let result = run_crawl().await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(summary) => info!(
            watches = summary.watches,
            notified = summary.notified,
            failed = summary.failed,
            elapsed_ms,
            "Crawl pass completed"
        ),
        Err(e) => error!("Crawl pass failed: {}", e),
    }

    Ok(CrawlResponse::finished(result, elapsed_ms))
}

async fn run_crawl() -> Result<PassSummary> {
    let storage = S3Storage::from_env().await?;
    let config_key = std::env::var("CONFIG_S3_KEY").unwrap_or_else(|_| "config.toml".to_string());
    let config = RemoteConfigLoader::new(&storage, config_key)
        .load_config()
        .await?;

    let store = Arc::new(RecordStore::new(storage));
    let crawler = WatchCrawler::from_config(&config, store)?;
    crawler.run_crawl_pass().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn failed_pass_reports_error() {
        let response = CrawlResponse::finished(Err(AppError::storage("bucket missing")), 12);
        assert!(!response.success);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Storage error: bucket missing");
        assert!(json.get("summary").is_none());
        assert_eq!(json["execution_time_ms"], 12);
    }
}
