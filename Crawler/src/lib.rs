// src/lib.rs

//! Gashapon stock watcher library.
//!
//! Polls the shop locator page for every registered watch and pushes a
//! LINE message to the owner when shops report stock.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
