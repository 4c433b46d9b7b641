// src/services/watches.rs

//! Watch registration and management for subscribers.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Watch, region};
use crate::storage::SubscriptionStore;

static PRODUCT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:product_code|jan_code)=([a-zA-Z0-9]+)").expect("product code pattern is valid")
});

/// Registered region name for a fragment such as `東京`.
///
/// Returns the first registry name (registry order) containing the input.
pub fn normalize_region(input: &str) -> Option<&'static str> {
    region::find_containing(input.trim())
}

/// Product code carried by a product page URL, if any.
pub fn extract_product_code(url: &str) -> Option<String> {
    PRODUCT_CODE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Register a watch for the subscriber at `address`.
///
/// The subscriber is created on first use.
pub async fn register_watch(
    store: &dyn SubscriptionStore,
    address: &str,
    region_input: &str,
    product_url: &str,
) -> Result<Watch> {
    let region = normalize_region(region_input)
        .ok_or_else(|| AppError::UnknownRegion(region_input.trim().to_string()))?;
    let product_url = product_url.trim();
    let product_code = extract_product_code(product_url).ok_or_else(|| {
        AppError::validation(format!("No product code found in URL: {product_url}"))
    })?;

    let subscriber = store.ensure_subscriber(address, None).await?;
    let watch = store
        .create_watch(Watch::new(subscriber.id, region, product_url, product_code))
        .await?;

    log::info!(
        "Registered watch {} ({} in {}) for {}",
        watch.id,
        watch.product_code,
        watch.region,
        address
    );
    Ok(watch)
}

/// Watches owned by the subscriber at `address`; unknown subscribers own none.
pub async fn list_watches(store: &dyn SubscriptionStore, address: &str) -> Result<Vec<Watch>> {
    match store.find_subscriber_by_address(address).await? {
        Some(subscriber) => store.watches_for_subscriber(subscriber.id).await,
        None => Ok(Vec::new()),
    }
}

/// Delete one of the subscriber's watches by id.
///
/// Returns `false` when the watch does not exist or belongs to someone else.
pub async fn remove_watch(
    store: &dyn SubscriptionStore,
    address: &str,
    watch_id: &str,
) -> Result<bool> {
    let watch_id = Uuid::parse_str(watch_id.trim())?;
    let Some(subscriber) = store.find_subscriber_by_address(address).await? else {
        return Ok(false);
    };

    let removed = store.delete_watch(watch_id, subscriber.id).await?;
    if removed {
        log::info!("Removed watch {watch_id} for {address}");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::storage::{LocalStorage, RecordStore, WatchStore};

    #[test]
    fn region_fragment_resolves_in_registry_order() {
        assert_eq!(normalize_region("東京"), Some("東京都"));
        assert_eq!(normalize_region("大阪"), Some("大阪府"));
        assert_eq!(normalize_region(" 北海道 "), Some("北海道"));
        assert_eq!(normalize_region("Tokyo"), None);
        assert_eq!(normalize_region(""), None);
    }

    #[test]
    fn product_code_from_either_parameter() {
        assert_eq!(
            extract_product_code("https://gashapon.jp/products/detail.php?jan_code=4570117912345"),
            Some("4570117912345".to_string())
        );
        assert_eq!(
            extract_product_code("https://gashapon.jp/shop/gplus_list.php?pref=13&product_code=ABC123&x=1"),
            Some("ABC123".to_string())
        );
        assert_eq!(extract_product_code("https://gashapon.jp/products/"), None);
        assert_eq!(extract_product_code("https://gashapon.jp/?product_code="), None);
    }

    #[tokio::test]
    async fn register_list_and_remove() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(LocalStorage::new(tmp.path()));
        let url = "https://gashapon.jp/products/detail.php?jan_code=ABC123";

        let watch = register_watch(&store, "U1", "東京", url).await.unwrap();
        assert_eq!(watch.region, "東京都");
        assert_eq!(watch.product_code, "ABC123");

        assert_eq!(list_watches(&store, "U1").await.unwrap(), vec![watch.clone()]);
        assert!(list_watches(&store, "U2").await.unwrap().is_empty());

        let id = watch.id.to_string();
        assert!(!remove_watch(&store, "U2", &id).await.unwrap());
        assert!(remove_watch(&store, "U1", &id).await.unwrap());
        assert!(list_watches(&store, "U1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::new(LocalStorage::new(tmp.path()));

        let err = register_watch(&store, "U1", "Atlantis", "https://x/?product_code=A1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownRegion(_)));

        let err = register_watch(&store, "U1", "東京都", "https://x/products")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.load_watches().await.unwrap().is_empty());

        assert!(remove_watch(&store, "U1", "not-a-uuid").await.is_err());
    }
}
