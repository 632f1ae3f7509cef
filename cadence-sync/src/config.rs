//! Configuration loading for the sync layer.
//!
//! All fields are required unless explicitly marked optional. No defaults
//! for required values; hosts either load a TOML file or construct the
//! struct and call `validate()`.

use cadence_store::CachePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Upper bound on the credential refresh call. A refresh that exceeds
    /// it settles as a terminal failure instead of stalling queued callers.
    pub refresh_timeout_ms: u64,
    /// How close to the soft expiry hint a token may get before the
    /// upcoming expiry is logged.
    pub early_refresh_margin_ms: i64,
    pub ttl: TtlConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtlConfig {
    /// Validity window for slow-changing bundles (profile, content,
    /// analytics, trends).
    pub long_ms: i64,
    /// Validity window for the AI suggestion feed.
    pub short_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// LMDB directory. Absent means an in-memory store (ephemeral session).
    pub path: Option<PathBuf>,
    pub max_size_mb: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl SyncConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.refresh_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refresh_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.early_refresh_margin_ms < 0 {
            return Err(ConfigError::InvalidValue {
                field: "early_refresh_margin_ms",
                reason: "must be >= 0".to_string(),
            });
        }
        if self.ttl.long_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl.long_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.ttl.short_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl.short_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.ttl.short_ms > self.ttl.long_ms {
            return Err(ConfigError::InvalidValue {
                field: "ttl.short_ms",
                reason: "must be <= ttl.long_ms".to_string(),
            });
        }
        if self.store.max_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.max_size_mb",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// The cache policy implied by the TTL section.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new()
            .with_long_ms(self.ttl.long_ms)
            .with_short_ms(self.ttl.short_ms)
    }
}
