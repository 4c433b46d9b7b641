// src/pipeline/mod.rs

//! Pipeline entry points for crawler operations.
//!
//! - `run_crawl_pass`: Fetch shops for every watch and notify owners

pub mod crawl;

pub use crawl::{PassLock, PassSummary, WatchCrawler, run_crawl_pass};
