// src/services/shops.rs

//! Shop availability fetcher.
//!
//! Queries the shop locator page for one (product, region) pair and hands
//! valid HTML to the [`ShopExtractor`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::{Config, Extraction, ShopRecord, region};
use crate::services::ShopExtractor;
use crate::utils::http;

/// Anything that can report which shops stock a product in a region.
#[async_trait]
pub trait ShopSource: Send + Sync {
    /// Shops stocking `product_code` in the named region.
    async fn fetch_shops(&self, product_code: &str, region: &str) -> Result<Vec<ShopRecord>>;
}

/// Fetches the shop locator page over HTTP.
pub struct ShopFetcher {
    client: Client,
    endpoint: String,
    extractor: ShopExtractor,
}

impl ShopFetcher {
    /// Create a fetcher from the crawler and extraction settings.
    pub fn new(config: &Config) -> Result<Self> {
        let client = http::create_async_client(&config.crawler)?;
        let extractor = ShopExtractor::from_config(&config.extraction)?;
        Ok(Self::with_client(client, &config.crawler.endpoint, extractor))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, extractor: ShopExtractor) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            extractor,
        }
    }

    /// Fetch shops for a product in a region.
    ///
    /// Never fails: unknown regions, transport errors, non-2xx answers and
    /// non-HTML bodies are logged and yield an empty list. Nothing is
    /// retried within the call.
    pub async fn fetch(&self, product_code: &str, region: &str) -> Vec<ShopRecord> {
        match self.lookup(product_code, region).await {
            Ok(extraction) => {
                self.log_extraction(product_code, region, &extraction);
                extraction.shops
            }
            Err(AppError::UnknownRegion(name)) => {
                log::error!("Invalid region name: {name}");
                Vec::new()
            }
            Err(e) => {
                log::error!("Shop lookup failed for product {product_code} in {region}: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch and extract, surfacing every failure as an error.
    pub async fn lookup(&self, product_code: &str, region: &str) -> Result<Extraction> {
        let region_code =
            region::resolve(region).ok_or_else(|| AppError::UnknownRegion(region.to_string()))?;
        if product_code.trim().is_empty() {
            return Err(AppError::validation("product code is empty"));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("pref", region_code), ("product_code", product_code)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UnexpectedStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("text/html") {
            return Err(AppError::UnexpectedContentType(content_type));
        }

        let html = response.text().await?;
        Ok(self.extractor.extract_detailed(&html))
    }

    fn log_extraction(&self, product_code: &str, region: &str, extraction: &Extraction) {
        match (&extraction.layout, extraction.shops.len()) {
            (None, _) => log::warn!(
                "No known shop layout matched for product {product_code} in {region}; \
                 either out of stock everywhere or the page markup changed"
            ),
            (Some(layout), 0) => log::warn!(
                "Shop layout '{layout}' matched for product {product_code} in {region} \
                 but no entry carried a shop name"
            ),
            (Some(layout), count) => log::info!(
                "Found {count} shops for product {product_code} in {region} (layout {layout})"
            ),
        }
    }
}

#[async_trait]
impl ShopSource for ShopFetcher {
    async fn fetch_shops(&self, product_code: &str, region: &str) -> Result<Vec<ShopRecord>> {
        Ok(self.fetch(product_code, region).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_region_is_rejected_before_any_request() {
        let mut config = Config::default();
        // Nothing listens here; an attempted request would be a transport error.
        config.crawler.endpoint = "http://127.0.0.1:9/shop".to_string();
        let fetcher = ShopFetcher::new(&config).unwrap();

        let err = fetcher.lookup("ABC123", "Atlantis").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownRegion(name) if name == "Atlantis"));
        assert!(fetcher.fetch("ABC123", "Atlantis").await.is_empty());
    }

    #[tokio::test]
    async fn empty_product_code_is_rejected() {
        let fetcher = ShopFetcher::new(&Config::default()).unwrap();
        let err = fetcher.lookup("  ", "東京都").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
