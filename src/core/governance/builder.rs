//! Facade construction from configuration

use super::facade::{BackgroundTask, GovernanceFacade};
use crate::config::Config;
use crate::core::cache_policy::CacheTtlPolicy;
use crate::core::cost::CostManager;
use crate::core::quota::{InMemoryPlanStore, PlanStore, QuotaService};
use crate::core::rate_limiter::{RateLimiter, WindowStore};
use crate::storage::ledger::{BoundedLedger, InMemoryLedger, UsageLedger};
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`GovernanceFacade`]
///
/// Anything not supplied falls back to an in-process implementation.
pub struct GovernanceBuilder {
    config: Config,
    ledger: Option<Arc<dyn UsageLedger>>,
    plans: Option<Arc<dyn PlanStore>>,
    window_store: Option<Arc<dyn WindowStore>>,
}

impl GovernanceBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ledger: None,
            plans: None,
            window_store: None,
        }
    }

    /// Set the usage ledger shared by budget and quota
    pub fn with_ledger(mut self, ledger: Arc<dyn UsageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the subscription plan source
    pub fn with_plan_store(mut self, plans: Arc<dyn PlanStore>) -> Self {
        self.plans = Some(plans);
        self
    }

    /// Set the distributed rate limit store
    pub fn with_window_store(mut self, store: Arc<dyn WindowStore>) -> Self {
        self.window_store = Some(store);
        self
    }

    /// Use Redis for the window store and the ledger
    ///
    /// A no-op pool leaves both on their in-process defaults.
    #[cfg(feature = "redis")]
    pub fn with_redis(self, pool: crate::storage::redis::RedisPool) -> Self {
        use crate::storage::redis::{RedisLedger, RedisWindowStore};

        if pool.is_noop() {
            tracing::debug!("Redis pool is no-op, keeping in-process stores");
            return self;
        }
        let ledger = Arc::new(
            RedisLedger::new(pool.clone()).with_timeout(self.config.storage.ledger_timeout()),
        );
        self.with_window_store(Arc::new(RedisWindowStore::new(pool)))
            .with_ledger(ledger)
    }

    /// Connect to Redis when `storage.redis.enabled` is set
    ///
    /// A failed connection or health check is logged and the engine runs
    /// in-process.
    #[cfg(feature = "redis")]
    pub async fn connect(self) -> Self {
        use crate::storage::redis::RedisPool;

        if !self.config.storage.redis.enabled {
            tracing::debug!("Redis disabled, using in-process stores");
            return self;
        }

        let pool = match RedisPool::new(&self.config.storage.redis).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("Redis connection failed, continuing in-process: {}", e);
                return self;
            }
        };
        match pool.health_check().await {
            Ok(()) => self.with_redis(pool),
            Err(e) => {
                tracing::warn!("Redis health check failed, continuing in-process: {}", e);
                self
            }
        }
    }

    /// Validate the configuration and assemble the facade
    ///
    /// Every ledger call is bounded by `storage.ledger_timeout_ms`. Inside a
    /// tokio runtime the local rate limit store is swept in the background
    /// for as long as the facade lives.
    pub fn build(self) -> Result<GovernanceFacade> {
        self.config.validate()?;

        let inner = self.ledger.unwrap_or_else(|| {
            info!("No usage ledger configured, keeping usage in memory");
            Arc::new(InMemoryLedger::new())
        });
        let ledger = Arc::new(BoundedLedger::new(
            inner,
            self.config.storage.ledger_timeout(),
        ));
        let plans = self
            .plans
            .unwrap_or_else(|| Arc::new(InMemoryPlanStore::new()));

        let mut limiter = RateLimiter::new(self.config.rate_limit.clone());
        if let Some(store) = self.window_store {
            limiter = limiter.with_distributed(store);
        }

        let policy = CacheTtlPolicy::new(&self.config.cache)?;
        let costs = CostManager::new(self.config.budget.clone(), policy, ledger.clone());
        let quotas = QuotaService::new(self.config.quota.clone(), plans, ledger.clone());

        let cleanup = match tokio::runtime::Handle::try_current() {
            Ok(_) => limiter.start_cleanup_task().map(BackgroundTask::new),
            Err(_) => {
                debug!("No tokio runtime, local rate limit store will not be swept");
                None
            }
        };

        info!(
            "Governance engine ready (distributed rate limiting: {})",
            limiter.is_distributed()
        );
        Ok(GovernanceFacade::new(
            self.config.governance,
            limiter,
            quotas,
            costs,
            ledger,
            cleanup,
        ))
    }
}

impl GovernanceFacade {
    /// Start building a facade from configuration
    pub fn builder(config: Config) -> GovernanceBuilder {
        GovernanceBuilder::new(config)
    }
}
