// src/storage/mod.rs

//! Storage abstractions for subscribers, watches and notification history.
//!
//! Records are kept as JSON documents in a key/value backend:
//!
//! ```text
//! storage/
//! ├── subscribers.json
//! ├── watches.json
//! └── notifications/        # Delivered notifications, one file per month
//!     └── 2026/
//!         ├── 09.json
//!         └── 10.json
//! ```

pub mod local;
mod records;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NotificationEvent, Subscriber, Watch};

// Re-export for convenience
pub use local::LocalStorage;
pub use records::RecordStore;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Reads and writes needed by a crawl pass.
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Every registered watch.
    async fn load_watches(&self) -> Result<Vec<Watch>>;

    /// Look up the subscriber owning a watch.
    async fn find_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>>;

    /// Persist a delivered notification.
    async fn record_notification(&self, event: &NotificationEvent) -> Result<()>;
}

/// Subscription management used by the command handlers.
#[async_trait]
pub trait SubscriptionStore: WatchStore {
    async fn find_subscriber_by_address(&self, address: &str) -> Result<Option<Subscriber>>;

    /// Return the subscriber for `address`, creating it when missing.
    async fn ensure_subscriber(
        &self,
        address: &str,
        display_name: Option<String>,
    ) -> Result<Subscriber>;

    async fn create_watch(&self, watch: Watch) -> Result<Watch>;

    async fn watches_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<Watch>>;

    /// Delete a watch owned by `subscriber_id` along with its history.
    ///
    /// Returns `false` when no such watch belongs to the subscriber.
    async fn delete_watch(&self, watch_id: Uuid, subscriber_id: Uuid) -> Result<bool>;

    async fn notifications_for_watch(&self, watch_id: Uuid) -> Result<Vec<NotificationEvent>>;
}

/// Key/value byte storage the record store is built on.
#[async_trait]
pub trait JsonBackend: Send + Sync {
    /// Read a key, returning `None` if it does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key, replacing any previous value.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Keys under `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
