//! Storage configuration validators

use super::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating storage configuration");
        if self.ledger_timeout_ms == 0 {
            return Err("Ledger timeout must be greater than 0".to_string());
        }
        self.redis.validate()
    }
}

impl Validate for RedisConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err("Redis URL cannot be empty".to_string());
        }

        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err("Redis URL must start with redis:// or rediss://".to_string());
        }

        if self.connection_timeout == 0 {
            return Err("Redis connection timeout must be greater than 0".to_string());
        }

        if self.key_prefix.contains(char::is_whitespace) {
            return Err("Redis key prefix cannot contain whitespace".to_string());
        }

        Ok(())
    }
}
