// src/config.rs

//! Configuration loading utilities.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual values.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

#[cfg(feature = "s3")]
pub use remote::RemoteConfigLoader;

/// Load configuration from a TOML file with environment overrides.
///
/// A missing or unreadable file falls back to defaults; the merged result
/// must still validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::debug!("No config file at {path:?}; using defaults");
        Config::default()
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "s3")]
mod remote {
    use crate::error::{AppError, Result};
    use crate::models::Config;
    use crate::storage::{JsonBackend, S3Storage};

    /// Config loader for the Lambda environment.
    pub struct RemoteConfigLoader<'a> {
        storage: &'a S3Storage,
        key: String,
    }

    impl<'a> RemoteConfigLoader<'a> {
        pub fn new(storage: &'a S3Storage, key: impl Into<String>) -> Self {
            Self {
                storage,
                key: key.into(),
            }
        }

        /// Load `config.toml` from the bucket, defaults when absent, then
        /// apply environment overrides.
        pub async fn load_config(&self) -> Result<Config> {
            let mut config = match self.storage.read_bytes(&self.key).await? {
                Some(bytes) => {
                    log::info!("Loading config from {}/{}", self.storage.location(), self.key);
                    let text = String::from_utf8(bytes).map_err(|e| {
                        AppError::config(format!("Config file {} is not valid UTF-8: {e}", self.key))
                    })?;
                    toml::from_str(&text)?
                }
                None => {
                    log::info!("No remote config at {}; using defaults", self.key);
                    Config::default()
                }
            };
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.crawler.timeout_secs, 30);
    }

    #[test]
    fn file_values_are_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[crawler]\nrequest_delay_ms = 250\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.crawler.request_delay_ms, 250);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[crawler]\ntimeout_secs = 0\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
