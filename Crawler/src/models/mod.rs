// src/models/mod.rs

//! Domain models for the stock watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
pub mod region;
mod selectors;
mod shop;
mod watch;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, ExtractionConfig, LoggingConfig, NotifyConfig, ServerConfig,
    StorageConfig,
};
pub use selectors::ShopLayout;
pub use shop::{ADDRESS_UNKNOWN, CrawlOutcome, Extraction, ShopRecord};
pub use watch::{NotificationEvent, NotificationPayload, Subscriber, Watch};
