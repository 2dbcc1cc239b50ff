//! Core rate limiter implementation

use super::local::LocalWindowStore;
use super::store::WindowStore;
use super::types::{LimiterStats, RateLimitResult, StoreBackend, WindowAdmission};
use crate::config::models::rate_limit::RateLimitConfig;
use crate::core::keys::RateKey;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Atomic counters behind [`LimiterStats`]
#[derive(Debug, Default)]
pub(super) struct StatCounters {
    pub(super) admitted: AtomicU64,
    pub(super) denied: AtomicU64,
    pub(super) fallbacks: AtomicU64,
    pub(super) unenforced: AtomicU64,
}

/// Sliding-window rate limiter
///
/// Consults the distributed store first and falls back to the in-process
/// store on any error or timeout. Never returns an error to the caller.
#[derive(Clone)]
pub struct RateLimiter {
    /// Rate limit configuration
    pub(super) config: RateLimitConfig,
    /// Shared store, if one is configured
    pub(super) distributed: Option<Arc<dyn WindowStore>>,
    /// Fallback store
    pub(super) local: Arc<dyn WindowStore>,
    /// Concrete handle to the default fallback, for cleanup
    pub(super) sweeper: Option<Arc<LocalWindowStore>>,
    /// Health counters
    pub(super) stats: Arc<StatCounters>,
}

impl RateLimiter {
    /// Create a rate limiter enforcing in-process only
    pub fn new(config: RateLimitConfig) -> Self {
        let local = Arc::new(LocalWindowStore::new());
        Self {
            config,
            distributed: None,
            local: local.clone(),
            sweeper: Some(local),
            stats: Arc::new(StatCounters::default()),
        }
    }

    /// Use a shared store ahead of the local fallback
    pub fn with_distributed(mut self, store: Arc<dyn WindowStore>) -> Self {
        self.distributed = Some(store);
        self
    }

    /// Replace the local fallback store
    pub fn with_local(mut self, store: Arc<dyn WindowStore>) -> Self {
        self.local = store;
        self.sweeper = None;
        self
    }

    /// Admit one event for a scope from the configured table
    pub async fn admit_scope(&self, scope: &str, identifier: &str) -> RateLimitResult {
        self.admit_scope_at(scope, identifier, Utc::now()).await
    }

    pub async fn admit_scope_at(
        &self,
        scope: &str,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        let limit = self.config.scope(scope);
        let key = RateKey::new(scope, identifier, limit.window_seconds);
        self.admit_at(&key, limit.limit, now).await
    }

    /// Admit one event for a key
    pub async fn admit(&self, key: &RateKey, limit: u32) -> RateLimitResult {
        self.admit_at(key, limit, Utc::now()).await
    }

    /// Admit one event for a key at an explicit instant
    pub async fn admit_at(&self, key: &RateKey, limit: u32, now: DateTime<Utc>) -> RateLimitResult {
        let window = Duration::from_secs(key.window_seconds);
        if !self.config.enabled {
            return RateLimitResult::unenforced(limit, window, now);
        }

        let storage_key = key.storage_key();

        let (answer, backend) = match self.distributed_admit(&storage_key, limit, window, now).await
        {
            Some(admission) => (Some(admission), StoreBackend::Distributed),
            None => match self.local.admit(&storage_key, limit, window, now).await {
                Ok(admission) => (Some(admission), self.local.backend()),
                Err(e) => {
                    warn!("Local rate limit store failed for {}: {}", storage_key, e);
                    (None, StoreBackend::Unenforced)
                }
            },
        };

        let result = match answer {
            Some(admission) => {
                RateLimitResult::from_admission(admission, limit, window, now, backend)
            }
            None => {
                self.stats.unenforced.fetch_add(1, Ordering::Relaxed);
                if self.config.fail_open {
                    RateLimitResult::unenforced(limit, window, now)
                } else {
                    RateLimitResult::closed(limit, window, now)
                }
            }
        };

        if result.allowed {
            self.stats.admitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.denied.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Rate limit exceeded for {}: {}/{} requests ({})",
                storage_key, result.current_count, limit, result.backend
            );
        }

        result
    }

    /// Ask the distributed store, bounded by the configured timeout
    ///
    /// Returns `None` when there is no distributed store or it failed; the
    /// failure is logged and counted.
    async fn distributed_admit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Option<WindowAdmission> {
        let store = self.distributed.as_ref()?;

        match timeout(self.store_timeout(), store.admit(key, limit, window, now)).await {
            Ok(Ok(admission)) => Some(admission),
            Ok(Err(e)) => {
                let fallbacks = self.stats.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Distributed rate limit store failed, using local fallback (fallbacks={}): {}",
                    fallbacks, e
                );
                None
            }
            Err(_) => {
                let fallbacks = self.stats.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Distributed rate limit store timed out after {}ms, using local fallback (fallbacks={})",
                    self.config.store_timeout_ms, fallbacks
                );
                None
            }
        }
    }

    pub(super) fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.config.store_timeout_ms)
    }

    /// Snapshot of the health counters
    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            admitted: self.stats.admitted.load(Ordering::Relaxed),
            denied: self.stats.denied.load(Ordering::Relaxed),
            fallbacks: self.stats.fallbacks.load(Ordering::Relaxed),
            unenforced: self.stats.unenforced.load(Ordering::Relaxed),
        }
    }
}
