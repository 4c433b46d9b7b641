// src/services/mod.rs

//! Service layer for the stock watcher.
//!
//! This module contains the business logic for:
//! - Shop extraction from locator pages (`ShopExtractor`)
//! - Fetching shop availability (`ShopFetcher`)
//! - Composing and pushing notifications (`Notifier`)
//! - Registering and managing watches

mod extract;
pub mod notify;
mod shops;
pub mod watches;

pub use extract::ShopExtractor;
pub use notify::{Delivery, LinePushClient, Notifier, PushTransport, compose_message};
pub use shops::{ShopFetcher, ShopSource};
pub use watches::{extract_product_code, list_watches, normalize_region, register_watch, remove_watch};
