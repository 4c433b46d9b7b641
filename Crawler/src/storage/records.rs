// src/storage/records.rs

//! JSON record store over any [`JsonBackend`].

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NotificationEvent, Subscriber, Watch};
use crate::storage::{JsonBackend, SubscriptionStore, WatchStore};

const SUBSCRIBERS_KEY: &str = "subscribers.json";
const WATCHES_KEY: &str = "watches.json";
const NOTIFICATIONS_PREFIX: &str = "notifications";

/// Subscriber, watch and notification records kept as JSON documents.
///
/// Read-modify-write cycles are serialized, so one store instance may be
/// shared by concurrent watch tasks.
pub struct RecordStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: JsonBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Notification archive key for a given delivery time.
    fn notification_key(at: DateTime<Utc>) -> String {
        format!("{}/{}/{:02}.json", NOTIFICATIONS_PREFIX, at.year(), at.month())
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.backend.read_bytes(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_list<T: Serialize + Sync>(&self, key: &str, items: &[T]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        self.backend.write_bytes(key, &bytes).await
    }
}

#[async_trait]
impl<B: JsonBackend> WatchStore for RecordStore<B> {
    async fn load_watches(&self) -> Result<Vec<Watch>> {
        self.read_list(WATCHES_KEY).await
    }

    async fn find_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>> {
        let subscribers: Vec<Subscriber> = self.read_list(SUBSCRIBERS_KEY).await?;
        Ok(subscribers.into_iter().find(|s| s.id == id))
    }

    async fn record_notification(&self, event: &NotificationEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = Self::notification_key(event.notified_at);

        let mut events: Vec<NotificationEvent> = self.read_list(&key).await?;
        events.push(event.clone());
        self.write_list(&key, &events).await?;

        log::debug!(
            "Recorded notification {} for watch {} in {}/{}",
            event.id,
            event.watch_id,
            self.backend.location(),
            key
        );
        Ok(())
    }
}

#[async_trait]
impl<B: JsonBackend> SubscriptionStore for RecordStore<B> {
    async fn find_subscriber_by_address(&self, address: &str) -> Result<Option<Subscriber>> {
        let subscribers: Vec<Subscriber> = self.read_list(SUBSCRIBERS_KEY).await?;
        Ok(subscribers.into_iter().find(|s| s.address == address))
    }

    async fn ensure_subscriber(
        &self,
        address: &str,
        display_name: Option<String>,
    ) -> Result<Subscriber> {
        let _guard = self.write_lock.lock().await;
        let mut subscribers: Vec<Subscriber> = self.read_list(SUBSCRIBERS_KEY).await?;
        if let Some(existing) = subscribers.iter().find(|s| s.address == address) {
            return Ok(existing.clone());
        }

        let subscriber = Subscriber::new(address, display_name);
        subscribers.push(subscriber.clone());
        self.write_list(SUBSCRIBERS_KEY, &subscribers).await?;
        log::info!("Created subscriber {} for {}", subscriber.id, address);
        Ok(subscriber)
    }

    async fn create_watch(&self, watch: Watch) -> Result<Watch> {
        let _guard = self.write_lock.lock().await;
        let mut watches: Vec<Watch> = self.read_list(WATCHES_KEY).await?;
        watches.push(watch.clone());
        self.write_list(WATCHES_KEY, &watches).await?;
        Ok(watch)
    }

    async fn watches_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<Watch>> {
        let watches: Vec<Watch> = self.read_list(WATCHES_KEY).await?;
        Ok(watches
            .into_iter()
            .filter(|w| w.subscriber_id == subscriber_id)
            .collect())
    }

    async fn delete_watch(&self, watch_id: Uuid, subscriber_id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut watches: Vec<Watch> = self.read_list(WATCHES_KEY).await?;
        let before = watches.len();
        watches.retain(|w| !(w.id == watch_id && w.subscriber_id == subscriber_id));
        if watches.len() == before {
            return Ok(false);
        }
        self.write_list(WATCHES_KEY, &watches).await?;

        for key in self.backend.list_keys(NOTIFICATIONS_PREFIX).await? {
            let mut events: Vec<NotificationEvent> = self.read_list(&key).await?;
            let count = events.len();
            events.retain(|e| e.watch_id != watch_id);
            if events.len() != count {
                self.write_list(&key, &events).await?;
            }
        }
        Ok(true)
    }

    async fn notifications_for_watch(&self, watch_id: Uuid) -> Result<Vec<NotificationEvent>> {
        let mut found = Vec::new();
        for key in self.backend.list_keys(NOTIFICATIONS_PREFIX).await? {
            let events: Vec<NotificationEvent> = self.read_list(&key).await?;
            found.extend(events.into_iter().filter(|e| e.watch_id == watch_id));
        }
        found.sort_by_key(|e| e.notified_at);
        Ok(found)
    }
}
