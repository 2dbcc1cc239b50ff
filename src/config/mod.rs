//! Configuration management for the governance engine
//!
//! This module handles loading, validation, and management of all engine configuration.

pub mod loader;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{GovernanceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sliding-window rate limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Cache TTL policy
    #[serde(default)]
    pub cache: CachePolicyConfig,
    /// Spend budget
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Subscription quotas
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Pipeline settings
    #[serde(default)]
    pub governance: GovernanceConfig,
    /// Distributed store
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GovernanceError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml(&content)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| GovernanceError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        dotenvy::dotenv().ok();

        let config = Self::default().apply_env(|key| std::env::var(key).ok())?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.rate_limit
            .validate()
            .map_err(|e| GovernanceError::Config(format!("Rate limit config error: {}", e)))?;

        self.cache
            .validate()
            .map_err(|e| GovernanceError::Config(format!("Cache config error: {}", e)))?;

        self.budget
            .validate()
            .map_err(|e| GovernanceError::Config(format!("Budget config error: {}", e)))?;

        self.quota
            .validate()
            .map_err(|e| GovernanceError::Config(format!("Quota config error: {}", e)))?;

        self.storage
            .validate()
            .map_err(|e| GovernanceError::Config(format!("Storage config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.rate_limit = self.rate_limit.merge(other.rate_limit);
        self.storage = self.storage.merge(other.storage);
        self.cache = other.cache;
        self.budget = other.budget;
        self.quota = other.quota;
        self.governance = other.governance;
        self.logging = other.logging;
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GovernanceError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}
