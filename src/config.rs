//! TOML configuration: provider API keys and HTTP client tuning.
//!
//! All keys are optional; a lookup whose key is absent short-circuits with an
//! explicit error string instead of calling the provider.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// V-World key (address geocoding, land-forest, regulation layers)
    pub vworld_key: Option<String>,
    /// Building-ledger service key
    pub building_key: Option<String>,
    /// Land-ledger service key
    pub land_key: Option<String>,
    /// Land-use regulation service key
    pub land_regulation_key: Option<String>,
    /// Per-request timeout for provider calls, seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed retry count for retryable providers
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retry_count() -> u32 {
    3
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            vworld_key: None,
            building_key: None,
            land_key: None,
            land_regulation_key: None,
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults (no keys) when the file is
    /// missing so the server can still serve fallback-only resolutions.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Config file {} not found; running without provider keys",
                path.display()
            );
            return Ok(Config::default());
        }
        Self::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str(
            r#"
            [providers]
            vworld_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.providers.vworld_key.as_deref(), Some("abc"));
        assert!(config.providers.building_key.is_none());
        assert_eq!(config.providers.timeout_secs, 15);
        assert_eq!(config.providers.retry_count, 3);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.providers.vworld_key.is_none());
    }
}
