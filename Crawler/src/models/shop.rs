// src/models/shop.rs

//! Shop records produced by extraction.

use serde::{Deserialize, Serialize};

/// Address used when a shop entry carries none.
pub const ADDRESS_UNKNOWN: &str = "住所不明";

/// A physical shop found to stock the watched product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShopRecord {
    /// Shop name, never empty
    pub name: String,

    /// Street address, or [`ADDRESS_UNKNOWN`]
    pub address: String,
}

impl ShopRecord {
    pub fn new(name: impl Into<String>, address: Option<String>) -> Self {
        Self {
            name: name.into(),
            address: address.unwrap_or_else(|| ADDRESS_UNKNOWN.to_string()),
        }
    }
}

/// Result of extracting shops from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Shops in page order
    pub shops: Vec<ShopRecord>,

    /// Name of the layout that matched, if any produced containers
    pub layout: Option<String>,
}

/// Per-watch result within a single crawl pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Fetch completed; the list may be empty
    Shops(Vec<ShopRecord>),

    /// Fetch could not complete
    Failed { cause: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_address_uses_placeholder() {
        let shop = ShopRecord::new("Shop One", None);
        assert_eq!(shop.address, "住所不明");
    }

    #[test]
    fn serializes_without_escaping_japanese() {
        let shop = ShopRecord::new("ガシャポンのデパート", Some("東京都豊島区".into()));
        let json = serde_json::to_string(&shop).unwrap();
        assert!(json.contains("東京都豊島区"));
    }
}
