//! Utility functions for rate limiter

use super::limiter::RateLimiter;
use super::types::{RateLimitResult, StoreBackend, WindowAdmission};
use crate::core::keys::RateKey;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

impl RateLimiter {
    /// Start background cleanup of the local fallback store
    ///
    /// Returns `None` when the fallback is not the built-in local store.
    pub fn start_cleanup_task(&self) -> Option<tokio::task::JoinHandle<()>> {
        let sweeper = self.sweeper.clone()?;
        let interval = Duration::from_secs(self.config.cleanup_interval_secs);
        Some(sweeper.start_cleanup_task(interval))
    }

    /// Keys held by the built-in local store, if that is the fallback
    pub fn tracked_keys(&self) -> Option<usize> {
        self.sweeper.as_ref().map(|sweeper| sweeper.len())
    }

    /// Current status for a key without consuming a slot
    pub async fn status(&self, key: &RateKey, limit: u32) -> Option<RateLimitResult> {
        self.status_at(key, limit, Utc::now()).await
    }

    pub async fn status_at(
        &self,
        key: &RateKey,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Option<RateLimitResult> {
        if !self.config.enabled {
            return None;
        }

        let window = Duration::from_secs(key.window_seconds);
        let storage_key = key.storage_key();

        if let Some(store) = &self.distributed {
            if let Ok(Ok(admission)) =
                timeout(self.store_timeout(), store.peek(&storage_key, window, now)).await
            {
                return Some(peek_result(admission, limit, window, now, store.backend()));
            }
        }

        self.local
            .peek(&storage_key, window, now)
            .await
            .ok()
            .map(|admission| peek_result(admission, limit, window, now, self.local.backend()))
    }

    /// Clear a key on every backend
    pub async fn reset(&self, key: &RateKey) {
        let storage_key = key.storage_key();

        if let Some(store) = &self.distributed {
            match timeout(self.store_timeout(), store.reset(&storage_key)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to reset {} on distributed store: {}", storage_key, e),
                Err(_) => warn!("Timed out resetting {} on distributed store", storage_key),
            }
        }

        if let Err(e) = self.local.reset(&storage_key).await {
            warn!("Failed to reset {} on local store: {}", storage_key, e);
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether a distributed store is configured
    pub fn is_distributed(&self) -> bool {
        self.distributed.is_some()
    }
}

/// A peek reports what an admit would decide, without the slot it would take
fn peek_result(
    admission: WindowAdmission,
    limit: u32,
    window: Duration,
    now: DateTime<Utc>,
    backend: StoreBackend,
) -> RateLimitResult {
    let decision = WindowAdmission {
        allowed: admission.current_count < limit,
        ..admission
    };
    let mut result = RateLimitResult::from_admission(decision, limit, window, now, backend);
    result.remaining = limit.saturating_sub(admission.current_count);
    result
}
