// src/models/selectors.rs

//! CSS selectors describing one known shop-list layout.

use serde::{Deserialize, Serialize};

/// Selectors for one shop-list layout on the locator page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShopLayout {
    /// Layout name for identification in logs
    pub name: String,

    /// Optional container; only its first match is searched for items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_selector: Option<String>,

    /// Selector for each shop entry
    pub item_selector: String,

    /// Candidate selectors for the shop name, tried in order
    #[serde(default = "default_name_selectors")]
    pub name_selectors: Vec<String>,

    /// Candidate selectors for the address, tried in order
    #[serde(default = "default_address_selectors")]
    pub address_selectors: Vec<String>,
}

fn default_name_selectors() -> Vec<String> {
    vec!["h3".into(), "dt".into(), "strong".into()]
}

fn default_address_selectors() -> Vec<String> {
    vec!["p.address".into(), "dd".into()]
}

impl ShopLayout {
    /// Create a layout with the standard name and address selectors.
    pub fn new(
        name: impl Into<String>,
        scope: Option<&str>,
        item: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            scope_selector: scope.map(str::to_string),
            item_selector: item.into(),
            name_selectors: default_name_selectors(),
            address_selectors: default_address_selectors(),
        }
    }

    /// Every selector string this layout uses.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.scope_selector
            .iter()
            .chain(std::iter::once(&self.item_selector))
            .chain(self.name_selectors.iter())
            .chain(self.address_selectors.iter())
            .map(String::as_str)
    }

    /// Layouts known for the shop locator, in priority order.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("shop_list_item", None, "div.shop-list-item"),
            Self::new("shop_detail", None, "dl.shop_detail"),
            Self::new("shop_list", Some("ul.shop_list"), "li"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_priority_order() {
        let names: Vec<_> = ShopLayout::defaults().into_iter().map(|l| l.name).collect();
        assert_eq!(names, ["shop_list_item", "shop_detail", "shop_list"]);
    }

    #[test]
    fn toml_layout_fills_default_selectors() {
        let layout: ShopLayout = toml::from_str(
            r#"
            name = "custom"
            item_selector = "article.store"
            "#,
        )
        .unwrap();
        assert_eq!(layout.name_selectors, ["h3", "dt", "strong"]);
        assert_eq!(layout.address_selectors, ["p.address", "dd"]);
        assert!(layout.scope_selector.is_none());
    }

    #[test]
    fn selectors_lists_scope_first() {
        let layout = ShopLayout::new("x", Some("ul.a"), "li");
        let all: Vec<_> = layout.selectors().collect();
        assert_eq!(all[0], "ul.a");
        assert_eq!(all[1], "li");
        assert_eq!(all.len(), 7);
    }
}
