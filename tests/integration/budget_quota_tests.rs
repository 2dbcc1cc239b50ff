//! Budget and quota integration tests
//!
//! Both components read the same ledger, so these tests seed it directly and
//! check what each side derives from it.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::FlakyLedger;
    use crate::common::fixtures::{RecordFactory, off_hours, trading_hours, weekend};
    use chrono::{Duration, TimeZone, Utc};
    use meterline::config::{BudgetConfig, CachePolicyConfig, QuotaConfig};
    use meterline::core::quota::InMemoryPlanStore;
    use meterline::{
        CacheTtlPolicy, Complexity, CostManager, InMemoryLedger, QuotaService, QuotaType,
        SubscriptionPlan, UsageLedger,
    };
    use std::sync::Arc;

    fn budget(daily: f64, monthly: f64, reserve: f64) -> BudgetConfig {
        BudgetConfig {
            daily_budget: daily,
            monthly_budget: monthly,
            emergency_reserve: reserve,
            ..BudgetConfig::default()
        }
    }

    fn cost_manager(config: BudgetConfig, ledger: Arc<dyn UsageLedger>) -> CostManager {
        let policy = CacheTtlPolicy::new(&CachePolicyConfig::default()).unwrap();
        CostManager::new(config, policy, ledger)
    }

    fn quota_service(ledger: Arc<dyn UsageLedger>) -> (QuotaService, Arc<InMemoryPlanStore>) {
        let plans = Arc::new(InMemoryPlanStore::new());
        let config = QuotaConfig {
            default_plan: SubscriptionPlan::new("free", 10, 2),
            ..QuotaConfig::default()
        };
        (QuotaService::new(config, plans.clone(), ledger), plans)
    }

    // ==================== Budget ====================

    #[tokio::test]
    async fn test_reserve_rations_spend_near_the_limit() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        ledger
            .append(&RecordFactory::analysis("alice", 95.0, now))
            .await
            .unwrap();

        let costs = cost_manager(budget(100.0, 3_000.0, 50.0), ledger);
        assert!(!costs.can_afford_at(10.0, now).await);
        assert!(costs.can_afford_at(2.0, now).await);
    }

    #[tokio::test]
    async fn test_monthly_limit_applies_across_days() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        for day in 1..=9 {
            let at = now - Duration::days(day);
            ledger
                .append(&RecordFactory::analysis("alice", 100.0, at))
                .await
                .unwrap();
        }

        let costs = cost_manager(budget(200.0, 1_000.0, 10.0), ledger);
        let state = costs.budget_state_at(now).await.unwrap();
        assert_approx_eq!(state.daily_spent, 0.0);
        assert_approx_eq!(state.monthly_spent, 900.0);
        assert!(costs.can_afford_at(50.0, now).await);
        assert!(!costs.can_afford_at(150.0, now).await);
    }

    #[tokio::test]
    async fn test_spend_from_last_month_is_ignored() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        ledger
            .append(&RecordFactory::analysis("alice", 999.0, now - Duration::days(31)))
            .await
            .unwrap();

        let costs = cost_manager(budget(100.0, 1_000.0, 10.0), ledger);
        assert_approx_eq!(costs.budget_state_at(now).await.unwrap().monthly_spent, 0.0);
    }

    #[tokio::test]
    async fn test_unreadable_spend_follows_fail_open() {
        let ledger = Arc::new(FlakyLedger::new());
        ledger.fail_reads(true);
        let now = trading_hours();

        let open = cost_manager(budget(100.0, 1_000.0, 10.0), ledger.clone());
        assert!(open.can_afford_at(5.0, now).await);

        let closed = cost_manager(
            BudgetConfig {
                fail_open: false,
                ..budget(100.0, 1_000.0, 10.0)
            },
            ledger,
        );
        assert!(!closed.can_afford_at(5.0, now).await);
    }

    #[test]
    fn test_estimate_uses_kind_and_complexity() {
        let costs = cost_manager(BudgetConfig::default(), Arc::new(InMemoryLedger::new()));
        assert_approx_eq!(costs.estimate_cost("stock_analysis", Complexity::Medium), 0.05);
        assert_approx_eq!(costs.estimate_cost("stock_analysis", Complexity::High), 0.075);
        assert_approx_eq!(costs.estimate_cost("unheard_of", Complexity::Medium), 0.02);
    }

    // ==================== Freshness ====================

    #[tokio::test]
    async fn test_freshness_threshold_by_session() {
        let costs = cost_manager(BudgetConfig::default(), Arc::new(InMemoryLedger::new()));

        assert_eq!(costs.freshness_threshold(trading_hours(), None).await, 900);
        assert_eq!(costs.freshness_threshold(off_hours(), None).await, 14_400);
        assert_eq!(costs.freshness_threshold(weekend(), None).await, 86_400);
    }

    #[tokio::test]
    async fn test_high_cost_request_during_trading_uses_ceiling() {
        let costs = cost_manager(BudgetConfig::default(), Arc::new(InMemoryLedger::new()));
        let cost = costs.estimate_cost("portfolio_review", Complexity::Medium);

        assert_eq!(costs.freshness_threshold(trading_hours(), Some(cost)).await, 600);
        // Below the boundary the session threshold stands
        assert_eq!(costs.freshness_threshold(trading_hours(), Some(0.05)).await, 900);
    }

    #[tokio::test]
    async fn test_tight_budget_doubles_threshold() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        ledger
            .append(&RecordFactory::analysis("alice", 60.0, now))
            .await
            .unwrap();
        let costs = cost_manager(budget(100.0, 3_000.0, 50.0), ledger);

        assert_eq!(costs.freshness_threshold(now, None).await, 1_800);

        let decision = costs
            .cache_decision_at(now - Duration::minutes(20), None, now)
            .await;
        assert!(decision.reuse);
        assert_eq!(decision.threshold_seconds, 1_800);
    }

    #[tokio::test]
    async fn test_cache_decision_boundaries() {
        let costs = cost_manager(BudgetConfig::default(), Arc::new(InMemoryLedger::new()));
        let now = trading_hours();

        assert!(costs.cache_decision_at(now, None, now).await.reuse);
        // Clock skew: a value from the future is brand new
        assert!(
            costs
                .cache_decision_at(now + Duration::seconds(30), None, now)
                .await
                .reuse
        );
        assert!(
            !costs
                .cache_decision_at(now - Duration::seconds(1_800), None, now)
                .await
                .reuse
        );
    }

    // ==================== Quota ====================

    #[tokio::test]
    async fn test_quota_counts_only_todays_records_for_the_caller() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        for record in [
            RecordFactory::analysis("alice", 0.05, now),
            RecordFactory::analysis("alice", 0.05, now - Duration::days(1)),
            RecordFactory::analysis("bob", 0.05, now),
            RecordFactory::failed("alice", now),
        ] {
            ledger.append(&record).await.unwrap();
        }

        let (quotas, _) = quota_service(ledger);
        let check = quotas
            .check_at(Some("alice"), QuotaType::Analysis, now)
            .await;
        assert!(!check.has_quota);
        assert_eq!(check.info.usage, 2);
        assert_eq!(check.info.remaining, 0);
    }

    #[tokio::test]
    async fn test_exhausted_plan_reports_full_usage() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        for _ in 0..10 {
            ledger.append(&RecordFactory::api("alice", now)).await.unwrap();
        }

        let (quotas, _) = quota_service(ledger);
        let check = quotas.check_quota_at(Some("alice"), "api", now).await;
        assert!(!check.has_quota);
        assert_eq!(check.info.usage, 10);
        assert_eq!(check.info.limit, 10);
        assert_eq!(check.info.remaining, 0);
        assert_eq!(
            check.info.resets_at,
            Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_subscribed_caller_gets_plan_limits() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        for _ in 0..10 {
            ledger.append(&RecordFactory::api("alice", now)).await.unwrap();
        }

        let (quotas, plans) = quota_service(ledger);
        plans.assign("alice", "pro");

        let check = quotas.check_at(Some("alice"), QuotaType::Api, now).await;
        assert!(check.has_quota);
        assert_eq!(check.info.plan, "pro");
        assert_eq!(check.info.limit, 10_000);

        plans.revoke("alice");
        let check = quotas.check_at(Some("alice"), QuotaType::Api, now).await;
        assert!(!check.has_quota);
        assert_eq!(check.info.plan, "free");
    }

    #[tokio::test]
    async fn test_unknown_quota_type_never_grants() {
        let (quotas, _) = quota_service(Arc::new(InMemoryLedger::new()));
        let check = quotas
            .check_quota_at(Some("alice"), "apii", trading_hours())
            .await;
        assert!(!check.has_quota);
        assert_eq!(check.info.quota_type, "apii");
        assert!(check.info.error.is_some());
    }

    #[tokio::test]
    async fn test_quota_resets_at_utc_midnight() {
        let ledger = Arc::new(InMemoryLedger::new());
        let now = trading_hours();
        for _ in 0..10 {
            ledger.append(&RecordFactory::api("alice", now)).await.unwrap();
        }

        let (quotas, _) = quota_service(ledger);
        let tomorrow = now + Duration::days(1);
        let check = quotas.check_at(Some("alice"), QuotaType::Api, tomorrow).await;
        assert!(check.has_quota);
        assert_eq!(check.info.usage, 0);
    }
}
