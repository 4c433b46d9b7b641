// src/services/notify.rs

//! Push notifications for watches with stock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{NotificationEvent, NotifyConfig, ShopRecord, Watch};
use crate::storage::WatchStore;
use crate::utils::http;

/// Shops listed in a message before the remainder is summarized.
pub const MAX_LISTED_SHOPS: usize = 10;

/// Compose the push message text for a watch.
///
/// Callers never pass an empty shop list; an empty list would still render a
/// title and the product link.
pub fn compose_message(watch: &Watch, shops: &[ShopRecord], now: NaiveDateTime) -> String {
    let title = format!(
        "[{} 時点]\n{}で在庫ありの店舗一覧",
        now.format("%Y-%m-%d %H:%M"),
        watch.region
    );

    let mut lines: Vec<String> = shops
        .iter()
        .take(MAX_LISTED_SHOPS)
        .map(|shop| format!("・{}\n  {}", shop.name, shop.address))
        .collect();
    if shops.len() > MAX_LISTED_SHOPS {
        lines.push(format!("\n他 {} 件...", shops.len() - MAX_LISTED_SHOPS));
    }

    format!(
        "{title}\n\n{}\n\n検索結果: {}",
        lines.join("\n"),
        watch.product_url
    )
}

/// Delivers a text message to one push address.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push_text(&self, to: &str, text: &str) -> Result<()>;
}

/// LINE Messaging API push client.
pub struct LinePushClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl LinePushClient {
    pub fn new(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Build a client, or `None` when no access token is configured.
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>> {
        let Some(token) = config
            .channel_access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };
        let client = http::create_push_client(config)?;
        Ok(Some(Self::new(client, &config.push_endpoint, token)))
    }
}

#[async_trait]
impl PushTransport for LinePushClient {
    async fn push_text(&self, to: &str, text: &str) -> Result<()> {
        let body = json!({
            "to": to,
            "messages": [{ "type": "text", "text": text }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(format!(
                "push API returned {status}: {}",
                detail.trim()
            )));
        }
        Ok(())
    }
}

/// Result of one notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the transport and recorded
    Sent,

    /// No transport configured
    Skipped,

    /// Transport rejected the message; nothing recorded
    Failed,
}

/// Sends stock messages and records accepted deliveries.
pub struct Notifier {
    transport: Option<Arc<dyn PushTransport>>,
    store: Arc<dyn WatchStore>,
}

impl Notifier {
    pub fn new(transport: Option<Arc<dyn PushTransport>>, store: Arc<dyn WatchStore>) -> Self {
        Self { transport, store }
    }

    /// Build a notifier using the LINE client when a token is configured.
    pub fn from_config(config: &NotifyConfig, store: Arc<dyn WatchStore>) -> Result<Self> {
        let transport = LinePushClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn PushTransport>);
        Ok(Self::new(transport, store))
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Push the shop list for `watch` to `address`.
    ///
    /// Never fails: transport errors are logged and a failure to record an
    /// accepted delivery does not undo it.
    pub async fn notify(&self, address: &str, watch: &Watch, shops: &[ShopRecord]) -> Delivery {
        let Some(transport) = &self.transport else {
            log::warn!("LINE_CHANNEL_ACCESS_TOKEN not set, skipping push message");
            return Delivery::Skipped;
        };

        let text = compose_message(watch, shops, Local::now().naive_local());
        if let Err(e) = transport.push_text(address, &text).await {
            log::error!("Failed to push message for watch {}: {e}", watch.id);
            return Delivery::Failed;
        }
        log::info!("Pushed {} shops for watch {}", shops.len(), watch.id);

        match NotificationEvent::new(watch.id, shops) {
            Ok(event) => {
                if let Err(e) = self.store.record_notification(&event).await {
                    log::error!("Failed to record notification for watch {}: {e}", watch.id);
                }
            }
            Err(e) => log::error!("Failed to encode notification for watch {}: {e}", watch.id),
        }
        Delivery::Sent
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn watch() -> Watch {
        Watch::new(
            Uuid::new_v4(),
            "東京都",
            "https://gashapon.jp/products/detail.php?jan_code=ABC123",
            "ABC123",
        )
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .unwrap()
    }

    fn shops(n: usize) -> Vec<ShopRecord> {
        (1..=n)
            .map(|i| ShopRecord::new(format!("Shop {i}"), Some(format!("Addr {i}"))))
            .collect()
    }

    #[test]
    fn message_lists_every_shop_up_to_ten() {
        let message = compose_message(&watch(), &shops(2), at());
        assert_eq!(
            message,
            "[2026-10-18 09:05 時点]\n東京都で在庫ありの店舗一覧\n\n\
             ・Shop 1\n  Addr 1\n・Shop 2\n  Addr 2\n\n\
             検索結果: https://gashapon.jp/products/detail.php?jan_code=ABC123"
        );

        let message = compose_message(&watch(), &shops(10), at());
        assert!(message.contains("・Shop 10\n  Addr 10"));
        assert!(!message.contains("他 "));
    }

    #[test]
    fn message_summarizes_beyond_ten() {
        let message = compose_message(&watch(), &shops(11), at());
        assert!(message.contains("・Shop 10\n  Addr 10\n\n他 1 件..."));
        assert!(!message.contains("Shop 11"));
        assert!(message.ends_with("\n\n検索結果: https://gashapon.jp/products/detail.php?jan_code=ABC123"));

        let message = compose_message(&watch(), &shops(25), at());
        assert!(message.contains("他 15 件..."));
    }

    #[test]
    fn missing_token_means_no_client() {
        let mut config = NotifyConfig::default();
        assert!(LinePushClient::from_config(&config).unwrap().is_none());

        config.channel_access_token = Some("  ".into());
        assert!(LinePushClient::from_config(&config).unwrap().is_none());

        config.channel_access_token = Some("token".into());
        assert!(LinePushClient::from_config(&config).unwrap().is_some());
    }
}
