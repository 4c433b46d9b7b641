// src/pipeline/crawl.rs

//! Watch crawling pipeline.
//!
//! One pass loads every watch, fetches shops for each and notifies owners
//! of watches with stock. A failing or panicking watch is logged and the
//! pass moves on.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlOutcome, Watch};
use crate::services::{Delivery, Notifier, ShopFetcher, ShopSource};
use crate::storage::WatchStore;

/// Counters for one crawl pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PassSummary {
    /// Watches loaded at pass start
    pub watches: usize,

    /// Watches whose owner was sent a message
    pub notified: usize,

    /// Watches with no shops this pass
    pub empty: usize,

    /// Watches with shops that could not be delivered (no address or no transport)
    pub skipped: usize,

    /// Watches that failed or panicked
    pub failed: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PassSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            watches: 0,
            notified: 0,
            empty: 0,
            skipped: 0,
            failed: 0,
            started_at: now,
            finished_at: now,
        }
    }

    fn record(&mut self, status: WatchStatus) {
        match status {
            WatchStatus::Notified => self.notified += 1,
            WatchStatus::Empty => self.empty += 1,
            WatchStatus::Skipped => self.skipped += 1,
            WatchStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchStatus {
    Notified,
    Empty,
    Skipped,
    Failed,
}

/// Guard against overlapping passes.
///
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct PassLock {
    inner: Arc<Mutex<()>>,
}

impl PassLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the lock for a pass, or `None` when one is already running.
    pub fn try_begin(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.inner).try_lock_owned().ok()
    }

    pub fn is_running(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

/// Runs crawl passes over every registered watch.
pub struct WatchCrawler {
    source: Arc<dyn ShopSource>,
    store: Arc<dyn WatchStore>,
    notifier: Notifier,
    max_concurrent: usize,
    request_delay: Duration,
}

impl WatchCrawler {
    pub fn new(source: Arc<dyn ShopSource>, store: Arc<dyn WatchStore>, notifier: Notifier) -> Self {
        Self {
            source,
            store,
            notifier,
            max_concurrent: 1,
            request_delay: Duration::ZERO,
        }
    }

    /// Build a crawler with the HTTP fetcher and LINE notifier.
    pub fn from_config(config: &Config, store: Arc<dyn WatchStore>) -> Result<Self> {
        let source = Arc::new(ShopFetcher::new(config)?);
        let notifier = Notifier::from_config(&config.notify, Arc::clone(&store))?;
        if !notifier.is_configured() {
            log::warn!("LINE_CHANNEL_ACCESS_TOKEN not set; stock messages will be skipped");
        }

        Ok(Self::new(source, store, notifier)
            .with_concurrency(config.crawler.max_concurrent)
            .with_request_delay(Duration::from_millis(config.crawler.request_delay_ms)))
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Run one pass over all watches.
    ///
    /// Only a failure to load the watch list is returned; everything that
    /// goes wrong for a single watch is logged and counted.
    pub async fn run_crawl_pass(&self) -> Result<PassSummary> {
        let mut summary = PassSummary::start();
        let watches = self.store.load_watches().await?;
        summary.watches = watches.len();

        if watches.is_empty() {
            log::info!("No watches registered; nothing to crawl");
            summary.finished_at = Utc::now();
            return Ok(summary);
        }
        log::info!("Crawling {} watches", watches.len());

        let mut results = stream::iter(watches)
            .map(|watch| async move {
                let status = AssertUnwindSafe(self.process_watch(&watch))
                    .catch_unwind()
                    .await;
                (watch, status)
            })
            .buffer_unordered(self.max_concurrent);

        let mut remaining = summary.watches;
        while let Some((watch, status)) = results.next().await {
            let status = match status {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    log::error!("Error processing watch {}: {e}", watch.id);
                    WatchStatus::Failed
                }
                Err(panic) => {
                    log::error!(
                        "Watch {} panicked: {}",
                        watch.id,
                        panic_message(panic.as_ref())
                    );
                    WatchStatus::Failed
                }
            };
            summary.record(status);

            remaining -= 1;
            if remaining > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        summary.finished_at = Utc::now();
        log::info!(
            "Crawl pass finished: {} watches, {} notified, {} empty, {} skipped, {} failed",
            summary.watches,
            summary.notified,
            summary.empty,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    async fn process_watch(&self, watch: &Watch) -> Result<WatchStatus> {
        let outcome = match self
            .source
            .fetch_shops(&watch.product_code, &watch.region)
            .await
        {
            Ok(shops) => CrawlOutcome::Shops(shops),
            Err(e) => CrawlOutcome::Failed {
                cause: e.to_string(),
            },
        };

        let shops = match outcome {
            CrawlOutcome::Shops(shops) if shops.is_empty() => {
                log::debug!("Watch {}: no shops with stock", watch.id);
                return Ok(WatchStatus::Empty);
            }
            CrawlOutcome::Shops(shops) => shops,
            CrawlOutcome::Failed { cause } => {
                return Err(AppError::crawl(format!("watch {}", watch.id), cause));
            }
        };

        let subscriber = self.store.find_subscriber(watch.subscriber_id).await?;
        let Some(address) = subscriber.as_ref().and_then(|s| s.delivery_address()) else {
            log::warn!(
                "Watch {}: {} shops found but subscriber {} has no delivery address",
                watch.id,
                shops.len(),
                watch.subscriber_id
            );
            return Ok(WatchStatus::Skipped);
        };

        Ok(match self.notifier.notify(address, watch, &shops).await {
            Delivery::Sent => WatchStatus::Notified,
            Delivery::Skipped => WatchStatus::Skipped,
            Delivery::Failed => WatchStatus::Failed,
        })
    }
}

/// Run one pass with the HTTP fetcher and LINE notifier.
pub async fn run_crawl_pass(config: &Config, store: Arc<dyn WatchStore>) -> Result<PassSummary> {
    WatchCrawler::from_config(config, store)?.run_crawl_pass().await
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
