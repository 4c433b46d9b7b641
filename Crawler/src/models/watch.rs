// src/models/watch.rs

//! Subscribers, watches, and notification events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ShopRecord;

/// A subscriber who owns watches and receives push messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    pub id: Uuid,

    /// Push destination (LINE user id)
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(address: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            display_name,
            created_at: Utc::now(),
        }
    }

    /// The push address, if one usable for delivery is on file.
    pub fn delivery_address(&self) -> Option<&str> {
        let address = self.address.trim();
        (!address.is_empty()).then_some(address)
    }
}

/// One subscription: a product watched in one region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watch {
    pub id: Uuid,

    /// Owning subscriber
    pub subscriber_id: Uuid,

    /// Registered region name (e.g., "東京都")
    pub region: String,

    /// Product page the subscriber registered
    pub product_url: String,

    /// Upstream product code extracted from the URL
    pub product_code: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Watch {
    pub fn new(
        subscriber_id: Uuid,
        region: impl Into<String>,
        product_url: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subscriber_id,
            region: region.into(),
            product_url: product_url.into(),
            product_code: product_code.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload stored with each notification event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPayload {
    pub shops: Vec<ShopRecord>,
}

/// Record of a push message accepted by the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub watch_id: Uuid,
    pub notified_at: DateTime<Utc>,

    /// Serialized [`NotificationPayload`] with the full shop list
    pub payload_json: String,
}

impl NotificationEvent {
    /// Build an event for a delivery that happened now.
    pub fn new(watch_id: Uuid, shops: &[ShopRecord]) -> Result<Self> {
        let payload = NotificationPayload {
            shops: shops.to_vec(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            watch_id,
            notified_at: Utc::now(),
            payload_json: serde_json::to_string(&payload)?,
        })
    }

    /// Decode the stored shop payload.
    pub fn payload(&self) -> Result<NotificationPayload> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_address_is_not_deliverable() {
        let subscriber = Subscriber::new("   ", None);
        assert_eq!(subscriber.delivery_address(), None);

        let subscriber = Subscriber::new("U1234", None);
        assert_eq!(subscriber.delivery_address(), Some("U1234"));
    }

    #[test]
    fn event_payload_keeps_every_shop() {
        let shops: Vec<ShopRecord> = (0..12)
            .map(|i| ShopRecord::new(format!("Shop {i}"), None))
            .collect();
        let event = NotificationEvent::new(Uuid::new_v4(), &shops).unwrap();

        assert!(event.payload_json.starts_with("{\"shops\":["));
        assert_eq!(event.payload().unwrap().shops, shops);
    }
}
