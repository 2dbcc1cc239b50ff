//! Governance facade integration tests
//!
//! Full admit/complete cycles against in-process stores.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::assertions::{AdmissionAssertions, plan_name};
    use crate::common::fixtures::{small_config, trading_hours, user, weekend};
    use crate::common::{EngineFactory, FailingWindowStore, FlakyLedger, SlowLedger};
    use chrono::Duration;
    use meterline::{
        CallerIdentity, CompletionOutcome, Complexity, DataCategory, GenerationPlan,
        GenerationRequest, GovernanceFacade, GovernanceRequest, QuotaType, StoreBackend,
        UsageFilter, UsageLedger,
    };
    use std::sync::Arc;
    use std::time::Instant;

    fn analysis_request(caller: &str, generation: GenerationRequest) -> GovernanceRequest {
        GovernanceRequest::new(user(caller), "analysis", "/api/analysis", QuotaType::Analysis)
            .with_generation(generation)
    }

    fn stock_analysis() -> GenerationRequest {
        GenerationRequest::new(DataCategory::Analysis, Complexity::Medium, "stock_analysis")
    }

    fn quote_request(caller: &str) -> GovernanceRequest {
        GovernanceRequest::new(user(caller), "search", "/api/quotes", QuotaType::Api)
    }

    // ==================== Pipeline Order ====================

    #[tokio::test]
    async fn test_generate_then_reuse_cycle() {
        let engine = EngineFactory::create();
        let now = trading_hours();

        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis()), now)
            .await
            .unwrap();
        assert_eq!(plan_name(ticket.plan()), "generate");
        engine
            .facade
            .complete(ticket, CompletionOutcome::success(1_200))
            .await;

        // Minutes later the freshly generated value is reused
        let later = now + Duration::minutes(5);
        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis().cached_at(now)), later)
            .await
            .unwrap();
        assert_eq!(plan_name(ticket.plan()), "serve_cached");
        engine
            .facade
            .complete(ticket, CompletionOutcome::success(4))
            .await;

        let today = engine
            .ledger
            .aggregate(&UsageFilter::day_of(now).for_caller("alice"))
            .await
            .unwrap();
        assert_eq!(today.request_count, 2);
        assert_eq!(today.cache_hits, 1);
        assert_approx_eq!(today.total_cost, 0.05);
    }

    #[tokio::test]
    async fn test_quota_is_checked_before_budget() {
        let engine = EngineFactory::create();
        let now = trading_hours();
        engine.spend(99.99, now).await;

        for i in 0..3 {
            let at = now + Duration::minutes(i);
            let ticket = engine
                .facade
                .admit_at(analysis_request("alice", stock_analysis().cached_at(at)), at)
                .await
                .unwrap();
            engine.facade.complete(ticket, CompletionOutcome::success(1)).await;
        }

        let result = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis()), now + Duration::minutes(5))
            .await;
        result.assert_quota_exceeded();
        assert_eq!(engine.facade.stats().budget_denied, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_is_checked_before_quota() {
        let mut config = small_config();
        config.quota.default_plan.api_daily = 0;
        let engine = EngineFactory::with_config(config);
        let now = trading_hours();

        for _ in 0..5 {
            engine
                .facade
                .admit_at(quote_request("alice"), now)
                .await
                .assert_quota_exceeded();
        }
        engine
            .facade
            .admit_at(quote_request("alice"), now)
            .await
            .assert_rate_limited();

        let stats = engine.facade.stats();
        assert_eq!(stats.quota_denied, 5);
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.admitted, 0);
    }

    // ==================== Budget Degradation ====================

    #[tokio::test]
    async fn test_tight_budget_extends_reuse() {
        let engine = EngineFactory::create();
        let now = trading_hours();
        let generated_at = now - Duration::minutes(20);

        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis().cached_at(generated_at)), now)
            .await
            .unwrap();
        assert_eq!(plan_name(ticket.plan()), "generate");

        // Remaining 40 is inside the reserve of 50
        engine.spend(60.0, now).await;
        let ticket = engine
            .facade
            .admit_at(analysis_request("bob", stock_analysis().cached_at(generated_at)), now)
            .await
            .unwrap();
        match ticket.plan() {
            GenerationPlan::ServeCached { decision } => {
                assert_eq!(decision.threshold_seconds, 1_800);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_serves_stale_or_refuses() {
        let engine = EngineFactory::create();
        let now = weekend();
        engine.spend(100.0, now).await;

        let stale = stock_analysis().cached_at(now - Duration::days(3));
        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stale), now)
            .await
            .unwrap();
        assert!(ticket.plan().serves_cached());
        assert_eq!(plan_name(ticket.plan()), "serve_stale");

        engine
            .facade
            .admit_at(analysis_request("bob", stock_analysis()), now)
            .await
            .assert_budget_exceeded();
        assert_eq!(engine.facade.stats().budget_denied, 2);
    }

    // ==================== Plans ====================

    #[tokio::test]
    async fn test_subscription_raises_quota() {
        let engine = EngineFactory::create();
        let now = trading_hours();
        engine.plans.assign("alice", "pro");

        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis()), now)
            .await
            .unwrap();
        assert_eq!(ticket.quota().plan, "pro");
        assert_eq!(ticket.quota().limit, 100);
    }

    #[tokio::test]
    async fn test_quota_is_available_again_next_day() {
        let engine = EngineFactory::create();
        let now = trading_hours();

        for i in 0..3 {
            let at = now + Duration::minutes(i);
            let ticket = engine
                .facade
                .admit_at(analysis_request("alice", stock_analysis().cached_at(at)), at)
                .await
                .unwrap();
            engine.facade.complete(ticket, CompletionOutcome::success(1)).await;
        }

        let tomorrow = now + Duration::days(1);
        let ticket = engine
            .facade
            .admit_at(analysis_request("alice", stock_analysis()), tomorrow)
            .await
            .unwrap();
        assert_eq!(ticket.quota().usage, 0);
    }

    #[tokio::test]
    async fn test_anonymous_callers_share_default_quota_per_address() {
        let engine = EngineFactory::create();
        let now = trading_hours();
        let anonymous = |addr: &str| {
            GovernanceRequest::new(
                CallerIdentity::anonymous(addr),
                "analysis",
                "/api/analysis",
                QuotaType::Analysis,
            )
            .with_generation(stock_analysis())
        };

        // The free tier allows three analyses a day
        for i in 0..3 {
            let at = now + Duration::minutes(i);
            let ticket = engine
                .facade
                .admit_at(anonymous("198.51.100.7"), at)
                .await
                .unwrap();
            engine.facade.complete(ticket, CompletionOutcome::success(900)).await;
        }

        let err = engine
            .facade
            .admit_at(anonymous("198.51.100.7"), now + Duration::minutes(5))
            .await
            .unwrap_err();
        match err {
            meterline::GovernanceError::QuotaExceeded(info) => {
                assert_eq!(info.plan, "free");
                assert_eq!(info.usage, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(
            engine
                .facade
                .admit_at(anonymous("203.0.113.4"), now + Duration::minutes(5))
                .await
                .is_ok()
        );
    }

    // ==================== Degraded Infrastructure ====================

    #[tokio::test]
    async fn test_unreadable_ledger_fails_open_by_default() {
        let ledger = Arc::new(FlakyLedger::new());
        ledger.fail_reads(true);
        let facade = GovernanceFacade::builder(small_config())
            .with_ledger(ledger.clone())
            .build()
            .unwrap();

        let ticket = facade
            .admit_at(analysis_request("alice", stock_analysis()), trading_hours())
            .await
            .unwrap();
        assert_eq!(plan_name(ticket.plan()), "generate");
        assert!(ticket.quota().error.is_some());

        // One quota read plus one shared daily/monthly budget read
        assert_eq!(facade.stats().ledger_read_failures, 3);
        assert_eq!(facade.stats().ledger_write_failures, 0);
    }

    #[tokio::test]
    async fn test_stalled_ledger_is_bounded_and_fails_open() {
        let ledger = Arc::new(SlowLedger::new(std::time::Duration::from_millis(500)));
        let facade = GovernanceFacade::builder(small_config())
            .with_ledger(ledger)
            .build()
            .unwrap();
        let now = trading_hours();
        let stale = stock_analysis().cached_at(now - Duration::hours(2));

        let started = Instant::now();
        let ticket = facade
            .admit_at(analysis_request("alice", stale), now)
            .await
            .unwrap();
        assert!(started.elapsed() < std::time::Duration::from_millis(400));
        assert_eq!(plan_name(ticket.plan()), "generate");

        let started = Instant::now();
        facade.complete(ticket, CompletionOutcome::success(1)).await;
        assert!(started.elapsed() < std::time::Duration::from_millis(400));

        let stats = facade.stats();
        assert_eq!(stats.ledger_read_failures, 3);
        assert_eq!(stats.ledger_write_failures, 1);
    }

    #[tokio::test]
    async fn test_unreadable_ledger_fails_closed_when_configured() {
        let ledger = Arc::new(FlakyLedger::new());
        ledger.fail_reads(true);
        let mut config = small_config();
        config.quota.fail_open = false;
        let facade = GovernanceFacade::builder(config)
            .with_ledger(ledger)
            .build()
            .unwrap();

        facade
            .admit_at(quote_request("alice"), trading_hours())
            .await
            .assert_quota_exceeded();
    }

    #[tokio::test]
    async fn test_ledger_write_failure_does_not_surface() {
        let ledger = Arc::new(FlakyLedger::new());
        let facade = GovernanceFacade::builder(small_config())
            .with_ledger(ledger.clone())
            .build()
            .unwrap();
        let now = trading_hours();

        ledger.fail_writes(true);
        let ticket = facade.admit_at(quote_request("alice"), now).await.unwrap();
        facade.complete(ticket, CompletionOutcome::success(3)).await;
        assert!(ledger.inner().is_empty().await);
        assert_eq!(facade.stats().ledger_write_failures, 1);

        ledger.fail_writes(false);
        let ticket = facade.admit_at(quote_request("alice"), now).await.unwrap();
        facade.complete(ticket, CompletionOutcome::success(3)).await;
        assert_eq!(ledger.inner().len().await, 1);
    }

    #[tokio::test]
    async fn test_failing_rate_limit_store_still_limits() {
        let store = Arc::new(FailingWindowStore::new());
        let facade = GovernanceFacade::builder(small_config())
            .with_window_store(store.clone())
            .build()
            .unwrap();
        let now = trading_hours();

        for _ in 0..5 {
            let ticket = facade.admit_at(quote_request("alice"), now).await.unwrap();
            assert_eq!(ticket.rate_limit().backend, StoreBackend::Local);
        }
        facade
            .admit_at(quote_request("alice"), now)
            .await
            .assert_rate_limited();

        assert_eq!(store.calls(), 6);
        assert_eq!(facade.stats().store_fallbacks, 6);
    }

    #[tokio::test]
    async fn test_facade_is_shareable_across_tasks() {
        let engine = EngineFactory::create();
        let facade = Arc::new(engine.facade);
        let now = trading_hours();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let facade = facade.clone();
                tokio::spawn(async move { facade.admit_at(quote_request("alice"), now).await.is_ok() })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }

    // ==================== Housekeeping ====================

    #[tokio::test]
    async fn test_local_window_store_is_swept_while_running() {
        let mut config = small_config();
        config.rate_limit.cleanup_interval_secs = 1;
        let facade = GovernanceFacade::builder(config).build().unwrap();
        assert!(facade.is_sweeping());

        // Windows from the fixed test instant are long expired by wall clock
        for caller in ["alice", "bob", "carol", "dave"] {
            facade
                .admit_at(quote_request(caller), trading_hours())
                .await
                .unwrap();
        }

        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        assert_eq!(facade.limiter().tracked_keys(), Some(0));
    }

    #[test]
    fn test_no_sweeper_outside_a_runtime() {
        let facade = GovernanceFacade::builder(small_config()).build().unwrap();
        assert!(!facade.is_sweeping());
    }
}
