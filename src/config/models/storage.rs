//! Storage configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Timeout for one usage ledger read or append in milliseconds
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_timeout_ms: default_ledger_timeout_ms(),
            redis: RedisConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Merge storage configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.ledger_timeout_ms != default_ledger_timeout_ms() {
            self.ledger_timeout_ms = other.ledger_timeout_ms;
        }
        self.redis = self.redis.merge(other.redis);
        self
    }

    /// Ledger timeout as a duration
    pub fn ledger_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ledger_timeout_ms)
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,
    /// Enable Redis (if false, only in-process enforcement is used)
    #[serde(default)]
    pub enabled: bool,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Prefix applied to every key the engine writes
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            enabled: false,
            connection_timeout: default_connection_timeout(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    /// Merge Redis configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != "redis://localhost:6379" {
            self.url = other.url;
        }
        if other.enabled {
            self.enabled = other.enabled;
        }
        if other.connection_timeout != default_connection_timeout() {
            self.connection_timeout = other.connection_timeout;
        }
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        self
    }
}
