//! Rate limiter integration tests
//!
//! Window behavior with the in-process store, and degradation when the
//! distributed store fails or stalls.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::trading_hours;
    use crate::common::{FailingWindowStore, SlowWindowStore};
    use chrono::Duration as ChronoDuration;
    use meterline::config::{RateLimitConfig, ScopeLimit};
    use meterline::core::rate_limiter::LocalWindowStore;
    use meterline::{RateKey, RateLimiter, StoreBackend};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            scopes: HashMap::from([("auth".to_string(), ScopeLimit::new(5, 300))]),
            ..RateLimitConfig::default()
        }
    }

    // ==================== Window Semantics ====================

    #[tokio::test]
    async fn test_auth_scope_allows_five_per_five_minutes() {
        let limiter = RateLimiter::new(config());
        let now = trading_hours();

        for i in 0..5 {
            let at = now + ChronoDuration::seconds(i * 10);
            assert!(limiter.admit_scope_at("auth", "ip:192.0.2.1", at).await.allowed);
        }

        let denied = limiter
            .admit_scope_at("auth", "ip:192.0.2.1", now + ChronoDuration::seconds(60))
            .await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        // Oldest event expires at now + 300s
        assert_eq!(denied.retry_after_secs, Some(240));

        let later = now + ChronoDuration::seconds(301);
        assert!(limiter.admit_scope_at("auth", "ip:192.0.2.1", later).await.allowed);
    }

    #[tokio::test]
    async fn test_window_slides_instead_of_resetting() {
        let limiter = RateLimiter::new(config());
        let key = RateKey::new("search", "user:carol", 60);
        let now = trading_hours();

        assert!(limiter.admit_at(&key, 2, now).await.allowed);
        let second = now + ChronoDuration::seconds(40);
        assert!(limiter.admit_at(&key, 2, second).await.allowed);

        // First event has left the window, the second has not
        let third = now + ChronoDuration::seconds(70);
        let result = limiter.admit_at(&key, 2, third).await;
        assert!(result.allowed);
        assert_eq!(result.current_count, 1);

        assert!(!limiter.admit_at(&key, 2, third).await.allowed);
    }

    #[tokio::test]
    async fn test_unknown_scope_uses_default_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let result = limiter
            .admit_scope_at("reports", "user:dave", trading_hours())
            .await;
        assert!(result.allowed);
        assert_eq!(result.limit, 100);
    }

    // ==================== Degradation ====================

    #[tokio::test]
    async fn test_failing_distributed_store_falls_back_to_local() {
        let store = Arc::new(FailingWindowStore::new());
        let limiter = RateLimiter::new(config()).with_distributed(store.clone());
        let now = trading_hours();

        for _ in 0..5 {
            let result = limiter.admit_scope_at("auth", "ip:192.0.2.1", now).await;
            assert!(result.allowed);
            assert_eq!(result.backend, StoreBackend::Local);
        }
        assert!(!limiter.admit_scope_at("auth", "ip:192.0.2.1", now).await.allowed);

        assert_eq!(store.calls(), 6);
        assert_eq!(limiter.stats().fallbacks, 6);
        assert_eq!(limiter.stats().denied, 1);
    }

    #[tokio::test]
    async fn test_stalled_distributed_store_is_abandoned() {
        let config = RateLimitConfig {
            store_timeout_ms: 20,
            ..config()
        };
        let limiter = RateLimiter::new(config).with_distributed(Arc::new(SlowWindowStore {
            delay: Duration::from_millis(500),
        }));

        let started = std::time::Instant::now();
        let result = limiter
            .admit_scope_at("auth", "ip:192.0.2.1", trading_hours())
            .await;

        assert!(result.allowed);
        assert_eq!(result.backend, StoreBackend::Local);
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(limiter.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_both_stores_down_fail_open() {
        let limiter = RateLimiter::new(config())
            .with_distributed(Arc::new(FailingWindowStore::new()))
            .with_local(Arc::new(FailingWindowStore::new()));

        let result = limiter
            .admit_scope_at("auth", "ip:192.0.2.1", trading_hours())
            .await;
        assert!(result.allowed);
        assert_eq!(result.backend, StoreBackend::Unenforced);
        assert_eq!(limiter.stats().unenforced, 1);
    }

    #[tokio::test]
    async fn test_both_stores_down_fail_closed() {
        let config = RateLimitConfig {
            fail_open: false,
            ..config()
        };
        let limiter = RateLimiter::new(config)
            .with_distributed(Arc::new(FailingWindowStore::new()))
            .with_local(Arc::new(FailingWindowStore::new()));

        let result = limiter
            .admit_scope_at("auth", "ip:192.0.2.1", trading_hours())
            .await;
        assert!(!result.allowed);
        assert!(result.retry_after_secs.is_some());
    }

    // ==================== Concurrency ====================

    #[tokio::test]
    async fn test_concurrent_admissions_respect_limit() {
        let limiter = Arc::new(RateLimiter::new(config()));
        let now = trading_hours();

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter
                        .admit_scope_at("auth", "ip:203.0.113.50", now)
                        .await
                        .allowed
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn test_local_store_cleanup_drops_idle_keys() {
        let store = Arc::new(LocalWindowStore::new());
        let limiter = RateLimiter::new(config()).with_local(store.clone());
        let now = trading_hours();

        limiter.admit_scope_at("auth", "ip:192.0.2.1", now).await;
        limiter.admit_scope_at("auth", "ip:192.0.2.2", now).await;
        assert_eq!(store.len(), 2);

        assert_eq!(store.cleanup(now + ChronoDuration::seconds(600)), 2);
        assert!(store.is_empty());
    }
}
