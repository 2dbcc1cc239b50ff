//! Redis connection management
//!
//! One multiplexed connection shared by every store, with a no-op mode for
//! deployments where Redis is disabled or unreachable.

use crate::config::RedisConfig;
use crate::utils::error::{GovernanceError, Result};
use redis::{Client, aio::MultiplexedConnection};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Redis connection pool (supports no-op mode when Redis is unavailable)
#[derive(Clone)]
pub struct RedisPool {
    /// Shared connection (None in no-op mode)
    pub(crate) connection: Option<MultiplexedConnection>,
    /// Configuration
    pub(crate) config: RedisConfig,
    /// Whether this is a no-op pool (Redis unavailable)
    pub(crate) noop_mode: bool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &Self::sanitize_url(&self.config.url))
            .field("key_prefix", &self.config.key_prefix)
            .field("noop_mode", &self.noop_mode)
            .finish()
    }
}

impl RedisPool {
    /// Connect to Redis, bounded by the configured connection timeout
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis connection pool");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str())?;

        let connect_timeout = Duration::from_secs(config.connection_timeout);
        let connection = timeout(connect_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                GovernanceError::timeout(format!(
                    "Redis connection timed out after {}s",
                    config.connection_timeout
                ))
            })??;

        info!("Redis connection pool created successfully");
        Ok(Self {
            connection: Some(connection),
            config: config.clone(),
            noop_mode: false,
        })
    }

    /// Create a no-op Redis pool (for when Redis is unavailable)
    pub fn create_noop() -> Self {
        info!("Creating no-op Redis pool (Redis unavailable)");
        Self {
            connection: None,
            config: RedisConfig {
                url: String::new(),
                enabled: false,
                ..RedisConfig::default()
            },
            noop_mode: true,
        }
    }

    /// Check if this is a no-op pool
    pub fn is_noop(&self) -> bool {
        self.noop_mode
    }

    /// Shared connection handle
    ///
    /// Fails in no-op mode so callers fall back instead of silently
    /// succeeding.
    pub(crate) fn connection(&self) -> Result<MultiplexedConnection> {
        self.connection
            .clone()
            .ok_or_else(|| GovernanceError::internal("Redis is unavailable (no-op pool)"))
    }

    /// Namespaced key, e.g. `meterline:ratelimit:search:user_1:60`
    pub fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.config.key_prefix, suffix)
    }

    /// PING the server, bounded by the connection timeout
    pub async fn health_check(&self) -> Result<()> {
        if self.noop_mode {
            debug!("Redis health check skipped (no-op mode)");
            return Ok(());
        }

        debug!("Performing Redis health check");
        let mut conn = self.connection()?;
        let ping = async {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<(), GovernanceError>(())
        };
        timeout(Duration::from_secs(self.config.connection_timeout), ping)
            .await
            .map_err(|_| GovernanceError::timeout("Redis health check timed out"))??;

        debug!("Redis health check passed");
        Ok(())
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}
