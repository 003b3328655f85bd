//! Configuration module
//!
//! Handles configuration loading for the archive client: TOML files with
//! environment variable overrides for container deployments.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default NNTP port
fn default_port() -> u16 {
    119
}

/// Default article cache capacity (number of articles)
fn default_cache_size() -> usize {
    300
}

/// Archive client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveConfig {
    /// News server hostname
    pub host: String,
    /// News server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Newsgroup holding the mailing-list mirror
    pub group: String,
    /// Maximum number of articles kept in the cache
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// Where to persist the cache between runs (no persistence if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
}

impl ArchiveConfig {
    /// Build a configuration for one host/group pair with defaults elsewhere
    #[must_use]
    pub fn new(host: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            group: group.into(),
            cache_size: default_cache_size(),
            cache_file: None,
        }
    }

    /// Validate configuration for correctness
    ///
    /// Checks for:
    /// - Empty host or group
    /// - Invalid port (0)
    /// - Zero cache capacity
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow::anyhow!("Configuration has empty host"));
        }
        if self.group.trim().is_empty() {
            return Err(anyhow::anyhow!("Configuration has empty group"));
        }
        if self.port == 0 {
            return Err(anyhow::anyhow!("Invalid port 0 for host '{}'", self.host));
        }
        if self.cache_size == 0 {
            return Err(anyhow::anyhow!("cache_size must be > 0"));
        }
        Ok(())
    }
}

/// Apply environment variable overrides to a configuration
///
/// Supported variables:
/// - `NEWS_ARCHIVE_HOST` - News server hostname
/// - `NEWS_ARCHIVE_PORT` - News server port
/// - `NEWS_ARCHIVE_GROUP` - Newsgroup name
/// - `NEWS_ARCHIVE_CACHE_SIZE` - Article cache capacity
/// - `NEWS_ARCHIVE_CACHE_FILE` - Cache persistence path
///
/// Environment variables take precedence over config file values.
fn apply_env_overrides(config: &mut ArchiveConfig) {
    if let Ok(host) = std::env::var("NEWS_ARCHIVE_HOST") {
        config.host = host;
    }
    if let Some(port) = std::env::var("NEWS_ARCHIVE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        config.port = port;
    }
    if let Ok(group) = std::env::var("NEWS_ARCHIVE_GROUP") {
        config.group = group;
    }
    if let Some(size) = std::env::var("NEWS_ARCHIVE_CACHE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        config.cache_size = size;
    }
    if let Ok(path) = std::env::var("NEWS_ARCHIVE_CACHE_FILE") {
        config.cache_file = Some(PathBuf::from(path));
    }
}

/// Load configuration from a TOML file, with environment variable overrides
pub fn load_config(config_path: &str) -> Result<ArchiveConfig> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let mut config: ArchiveConfig = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    apply_env_overrides(&mut config);
    config.validate()?;

    Ok(config)
}
