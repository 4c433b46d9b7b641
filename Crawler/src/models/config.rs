// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ShopLayout;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Shop extraction heuristics
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Push delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Trigger endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Watch store location
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay settings from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay settings from an arbitrary variable lookup.
    ///
    /// Empty values count as unset; unparseable numbers are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("LINE_CHANNEL_ACCESS_TOKEN") {
            self.notify.channel_access_token = Some(token);
        }
        if let Some(secret) = get("CRON_SECRET") {
            self.server.cron_secret = Some(secret);
        }
        if let Some(addr) = get("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(dir) = get("STORAGE_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(endpoint) = get("UPSTREAM_ENDPOINT") {
            self.crawler.endpoint = endpoint;
        }
        if let Some(secs) = parse_var(get("CRAWL_TIMEOUT_SECS"), "CRAWL_TIMEOUT_SECS") {
            self.crawler.timeout_secs = secs;
        }
        if let Some(n) = parse_var(get("MAX_CONCURRENT"), "MAX_CONCURRENT") {
            self.crawler.max_concurrent = n;
        }
        if let Some(ms) = parse_var(get("REQUEST_DELAY_MS"), "REQUEST_DELAY_MS") {
            self.crawler.request_delay_ms = ms;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        url::Url::parse(&self.crawler.endpoint)
            .map_err(|e| AppError::validation(format!("crawler.endpoint: {e}")))?;
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        if self.extraction.layouts.is_empty() {
            return Err(AppError::validation("No shop layouts defined"));
        }
        let selectors = self
            .extraction
            .content_selectors
            .iter()
            .map(String::as_str)
            .chain(self.extraction.layouts.iter().flat_map(|l| l.selectors()));
        for selector in selectors {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>, key: &str) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring {key}={value:?}: not a valid number");
            None
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Shop locator page queried once per watch
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Watches processed at the same time (1 = one after another)
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay between finished watches in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: 0,
        }
    }
}

/// Shop extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Main content probes, tried in order before falling back to `body`
    #[serde(default = "defaults::content_selectors")]
    pub content_selectors: Vec<String>,

    /// Shop layouts, tried in order; the first with any entry wins
    #[serde(default = "ShopLayout::defaults")]
    pub layouts: Vec<ShopLayout>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_selectors: defaults::content_selectors(),
            layouts: ShopLayout::defaults(),
        }
    }
}

/// Push delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// LINE channel access token; delivery is skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_access_token: Option<String>,

    /// Push message API endpoint
    #[serde(default = "defaults::push_endpoint")]
    pub push_endpoint: String,

    #[serde(default = "defaults::push_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            push_endpoint: defaults::push_endpoint(),
            timeout_secs: defaults::push_timeout(),
        }
    }
}

/// Trigger endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,

    /// Shared secret expected as `Authorization: Bearer <secret>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
            cron_secret: None,
        }
    }
}

/// Watch store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn endpoint() -> String {
        "https://gashapon.jp/shop/gplus_list.php".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        1
    }

    // Extraction defaults
    pub fn content_selectors() -> Vec<String> {
        vec!["div#main_content".into(), "div.main_content".into()]
    }

    // Notify defaults
    pub fn push_endpoint() -> String {
        "https://api.line.me/v2/bot/message/push".into()
    }
    pub fn push_timeout() -> u64 {
        10
    }

    // Server defaults
    pub fn bind_addr() -> String {
        "0.0.0.0:8000".into()
    }

    pub fn data_dir() -> PathBuf {
        PathBuf::from("storage")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(Config::default().crawler.timeout_secs, 30);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.extraction.layouts[0].item_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_relative_endpoint() {
        let mut config = Config::default();
        config.crawler.endpoint = "/shop/gplus_list.php".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_concurrent = 4

            [server]
            cron_secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.max_concurrent, 4);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.server.cron_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.extraction.layouts.len(), 3);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
            ("CRON_SECRET", "secret"),
            ("MAX_CONCURRENT", "3"),
            ("STORAGE_DIR", "/tmp/watches"),
        ]));
        assert_eq!(config.notify.channel_access_token.as_deref(), Some("token"));
        assert_eq!(config.server.cron_secret.as_deref(), Some("secret"));
        assert_eq!(config.crawler.max_concurrent, 3);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/watches"));
    }

    #[test]
    fn env_ignores_empty_and_garbage() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("CRON_SECRET", ""),
            ("CRAWL_TIMEOUT_SECS", "soon"),
        ]));
        assert!(config.server.cron_secret.is_none());
        assert_eq!(config.crawler.timeout_secs, 30);
    }

    #[test]
    fn example_config_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.extraction.layouts, ShopLayout::defaults());
        assert_eq!(config.crawler.endpoint, CrawlerConfig::default().endpoint);
    }
}
