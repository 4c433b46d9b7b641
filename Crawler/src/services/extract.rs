// src/services/extract.rs

//! Shop extraction service.
//!
//! Turns a shop locator page into shop records. The page markup is not
//! guaranteed stable, so known layouts are tried in priority order and the
//! first layout that yields any entry wins. Results are never merged across
//! layouts.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Extraction, ExtractionConfig, ShopLayout, ShopRecord};
use crate::utils::normalize_whitespace;

/// Service for extracting shop records from locator pages.
pub struct ShopExtractor {
    content: Vec<Selector>,
    body: Selector,
    layouts: Vec<CompiledLayout>,
}

struct CompiledLayout {
    name: String,
    scope: Option<Selector>,
    item: Selector,
    names: Vec<Selector>,
    addresses: Vec<Selector>,
}

impl CompiledLayout {
    fn compile(layout: &ShopLayout) -> Result<Self> {
        Ok(Self {
            name: layout.name.clone(),
            scope: layout
                .scope_selector
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            item: parse_selector(&layout.item_selector)?,
            names: parse_all(&layout.name_selectors)?,
            addresses: parse_all(&layout.address_selectors)?,
        })
    }

    /// Shop containers of this layout within `content`, in document order.
    fn containers<'a>(&self, content: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let scope = match &self.scope {
            Some(selector) => match content.select(selector).next() {
                Some(scope) => scope,
                None => return Vec::new(),
            },
            None => content,
        };
        scope.select(&self.item).collect()
    }

    fn parse_shop(&self, item: ElementRef<'_>) -> Option<ShopRecord> {
        let name = first_text(item, &self.names)?;
        let address = first_text(item, &self.addresses);
        Some(ShopRecord::new(name, address))
    }
}

impl ShopExtractor {
    /// Compile the given content probes and layouts.
    pub fn new(content_selectors: &[String], layouts: &[ShopLayout]) -> Result<Self> {
        Ok(Self {
            content: parse_all(content_selectors)?,
            body: parse_selector("body")?,
            layouts: layouts
                .iter()
                .map(CompiledLayout::compile)
                .collect::<Result<_>>()?,
        })
    }

    /// Build an extractor from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::new(&config.content_selectors, &config.layouts)
    }

    /// Extract shops from a page. Never fails; no match yields no shops.
    pub fn extract(&self, html: &str) -> Vec<ShopRecord> {
        self.extract_detailed(html).shops
    }

    /// Extract shops and report which layout matched.
    pub fn extract_detailed(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        let content = self.main_content(&document);

        self.layouts
            .iter()
            .find_map(|layout| {
                let containers = layout.containers(content);
                if containers.is_empty() {
                    return None;
                }
                log::debug!(
                    "Shop layout '{}' matched {} entries",
                    layout.name,
                    containers.len()
                );
                Some(Extraction {
                    shops: containers
                        .into_iter()
                        .filter_map(|item| layout.parse_shop(item))
                        .collect(),
                    layout: Some(layout.name.clone()),
                })
            })
            .unwrap_or_default()
    }

    /// Main content region: first matching probe, else body, else the root.
    fn main_content<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        self.content
            .iter()
            .chain(std::iter::once(&self.body))
            .find_map(|selector| document.select(selector).next())
            .unwrap_or_else(|| document.root_element())
    }
}

/// First selector whose first match has non-empty text.
fn first_text(item: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let element = item.select(selector).next()?;
        let text = normalize_whitespace(&element.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    })
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn parse_all(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| parse_selector(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ADDRESS_UNKNOWN;

    fn extractor() -> ShopExtractor {
        ShopExtractor::from_config(&ExtractionConfig::default()).unwrap()
    }

    fn names(shops: &[ShopRecord]) -> Vec<&str> {
        shops.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
        assert!(ShopExtractor::new(&["[[invalid".to_string()], &[]).is_err());
    }

    #[test]
    fn extracts_shop_list_items() {
        let html = r#"
            <html><body><div id="main_content">
              <div class="shop-list-item"><h3>Shop A</h3><p class="address">Tokyo 1-1</p></div>
              <div class="shop-list-item"><h3>Shop B</h3><p class="address">Tokyo 2-2</p></div>
            </div></body></html>"#;

        let extraction = extractor().extract_detailed(html);
        assert_eq!(extraction.layout.as_deref(), Some("shop_list_item"));
        assert_eq!(
            extraction.shops,
            vec![
                ShopRecord::new("Shop A", Some("Tokyo 1-1".into())),
                ShopRecord::new("Shop B", Some("Tokyo 2-2".into())),
            ]
        );
    }

    #[test]
    fn second_layout_does_not_pick_up_third() {
        let html = r#"
            <body>
              <dl class="shop_detail"><dt>Detail Shop</dt><dd>Osaka 3-3</dd></dl>
              <ul class="shop_list"><li><strong>List Shop</strong></li></ul>
            </body>"#;

        let extraction = extractor().extract_detailed(html);
        assert_eq!(extraction.layout.as_deref(), Some("shop_detail"));
        assert_eq!(names(&extraction.shops), ["Detail Shop"]);
        assert_eq!(extraction.shops[0].address, "Osaka 3-3");
    }

    #[test]
    fn list_items_use_first_shop_list_only() {
        let html = r#"
            <body>
              <ul class="shop_list"><li><strong>Shop One</strong></li><li><strong>Shop Two</strong></li></ul>
              <ul class="shop_list"><li><strong>Elsewhere</strong></li></ul>
            </body>"#;

        let shops = extractor().extract(html);
        assert_eq!(names(&shops), ["Shop One", "Shop Two"]);
        assert!(shops.iter().all(|s| s.address == ADDRESS_UNKNOWN));
    }

    #[test]
    fn nameless_containers_are_skipped() {
        let html = r#"
            <body>
              <div class="shop-list-item"><p class="address">No name here</p></div>
              <div class="shop-list-item"><h3>   </h3><strong>Fallback Name</strong></div>
              <div class="shop-list-item"><h3>Named</h3></div>
            </body>"#;

        let extraction = extractor().extract_detailed(html);
        assert_eq!(names(&extraction.shops), ["Fallback Name", "Named"]);
        assert_eq!(extraction.shops[1].address, ADDRESS_UNKNOWN);
    }

    #[test]
    fn matched_layout_with_no_names_does_not_fall_through() {
        let html = r#"
            <body>
              <div class="shop-list-item"><span>icon</span></div>
              <dl class="shop_detail"><dt>Should not appear</dt></dl>
            </body>"#;

        let extraction = extractor().extract_detailed(html);
        assert_eq!(extraction.layout.as_deref(), Some("shop_list_item"));
        assert!(extraction.shops.is_empty());
    }

    #[test]
    fn address_prefers_tagged_paragraph_over_dd() {
        let html = r#"
            <body><dl class="shop_detail">
              <dt>Shop</dt><dd>Opening hours 10-20</dd><p class="address">Nagoya 4-4</p>
            </dl></body>"#;

        let shops = extractor().extract(html);
        assert_eq!(shops[0].address, "Nagoya 4-4");
    }

    #[test]
    fn main_content_limits_search() {
        let html = r#"
            <body>
              <div class="shop-list-item"><h3>Sidebar Shop</h3></div>
              <div class="main_content">
                <ul class="shop_list"><li><h3>Main Shop</h3></li></ul>
              </div>
            </body>"#;

        let shops = extractor().extract(html);
        assert_eq!(names(&shops), ["Main Shop"]);
    }

    #[test]
    fn whitespace_is_normalized() {
        let html = "<body><dl class=\"shop_detail\"><dt>\n  Shop\n   Name </dt>\
                    <dd> Tokyo\n Shibuya </dd></dl></body>";

        let shops = extractor().extract(html);
        assert_eq!(shops[0], ShopRecord::new("Shop Name", Some("Tokyo Shibuya".into())));
    }

    #[test]
    fn unrecognized_page_yields_nothing() {
        let extraction = extractor().extract_detailed("<html><body><p>該当する店舗はありません</p></body></html>");
        assert_eq!(extraction, Extraction::default());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn extraction_is_repeatable() {
        let html = r#"<body><ul class="shop_list">
            <li><h3>B</h3></li><li><h3>A</h3></li><li><h3>C</h3></li></ul></body>"#;

        let extractor = extractor();
        let first = extractor.extract(html);
        let second = extractor.extract(html);
        assert_eq!(first, second);
        assert_eq!(names(&first), ["B", "A", "C"]);
    }
}
