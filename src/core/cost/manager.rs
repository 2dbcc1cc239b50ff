//! Budget tracking and freshness decisions

use super::types::{BudgetState, CacheFreshnessDecision, Complexity};
use crate::config::models::budget::BudgetConfig;
use crate::core::cache_policy::CacheTtlPolicy;
use crate::storage::ledger::{UsageAggregate, UsageFilter, UsageLedger, UsageRecord};
use crate::utils::error::{GovernanceError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tracks paid-generation spend against daily and monthly budgets
///
/// Spend is read back from the usage ledger on every check; the manager
/// keeps no running totals of its own.
#[derive(Clone)]
pub struct CostManager {
    config: BudgetConfig,
    policy: CacheTtlPolicy,
    ledger: Arc<dyn UsageLedger>,
}

impl CostManager {
    pub fn new(config: BudgetConfig, policy: CacheTtlPolicy, ledger: Arc<dyn UsageLedger>) -> Self {
        Self {
            config,
            policy,
            ledger,
        }
    }

    /// TTL policy backing the freshness thresholds
    pub fn policy(&self) -> &CacheTtlPolicy {
        &self.policy
    }

    /// Estimated USD cost of one request
    pub fn estimate_cost(&self, request_kind: &str, complexity: Complexity) -> f64 {
        let base = match self.config.base_cost(request_kind) {
            Some(cost) => cost,
            None => {
                debug!(
                    "No base cost for request kind '{}', using default {}",
                    request_kind, self.config.default_cost
                );
                self.config.default_cost
            }
        };
        base * self.config.multiplier(complexity)
    }

    /// Current spend read from the ledger
    pub async fn budget_state(&self) -> Result<BudgetState> {
        self.budget_state_at(Utc::now()).await
    }

    pub async fn budget_state_at(&self, now: DateTime<Utc>) -> Result<BudgetState> {
        let day = UsageFilter::day_of(now);
        let month = UsageFilter::month_of(now);
        let (daily, monthly) = tokio::join!(self.ledger.aggregate(&day), self.ledger.aggregate(&month));
        let (daily, monthly) = (daily?, monthly?);

        Ok(BudgetState {
            daily_spent: daily.total_cost,
            monthly_spent: monthly.total_cost,
            daily_limit: self.config.daily_budget,
            monthly_limit: self.config.monthly_budget,
            emergency_reserve: self.config.emergency_reserve,
        })
    }

    /// Budget state, or `None` when the ledger cannot be read
    pub async fn budget_snapshot_at(&self, now: DateTime<Utc>) -> Option<BudgetState> {
        match self.budget_state_at(now).await {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Budget read failed, fail_open={}: {}", self.config.fail_open, e);
                None
            }
        }
    }

    /// Whether spending `amount` now stays within budget
    pub async fn can_afford(&self, amount: f64) -> bool {
        self.can_afford_at(amount, Utc::now()).await
    }

    pub async fn can_afford_at(&self, amount: f64, now: DateTime<Utc>) -> bool {
        let budget = self.budget_snapshot_at(now).await;
        self.affordability(amount, budget.as_ref()).is_ok()
    }

    /// Like [`can_afford_at`](Self::can_afford_at), but a denial is a
    /// `BudgetExceeded` error carrying the remaining budget
    pub async fn ensure_affordable_at(&self, amount: f64, now: DateTime<Utc>) -> Result<()> {
        let budget = self.budget_snapshot_at(now).await;
        self.affordability(amount, budget.as_ref())
    }

    /// Affordability against an already-read budget state
    ///
    /// `None` means spend is unknown and follows `fail_open`.
    pub fn affordability(&self, amount: f64, budget: Option<&BudgetState>) -> Result<()> {
        let Some(state) = budget else {
            if self.config.fail_open {
                return Ok(());
            }
            return Err(GovernanceError::BudgetExceeded {
                estimated_cost: amount,
                daily_remaining: 0.0,
                monthly_remaining: 0.0,
            });
        };

        if state.can_afford(amount) {
            return Ok(());
        }

        debug!(
            "Budget denies ${:.4}: spent ${:.4}/{:.2} today, ${:.4}/{:.2} this month",
            amount, state.daily_spent, state.daily_limit, state.monthly_spent, state.monthly_limit
        );
        Err(GovernanceError::BudgetExceeded {
            estimated_cost: amount,
            daily_remaining: state.daily_remaining(),
            monthly_remaining: state.monthly_remaining(),
        })
    }

    /// Session threshold, capped for high-cost requests; ignores the budget
    pub fn base_threshold(&self, now: DateTime<Utc>, estimated_cost: Option<f64>) -> u64 {
        let session = self.policy.threshold_at(now);
        match estimated_cost {
            Some(cost) if cost > self.config.high_cost_boundary => {
                session.min(self.config.high_cost_ceiling_secs)
            }
            _ => session,
        }
    }

    /// Maximum age in seconds at which a cached value counts as fresh
    ///
    /// Doubled when the remaining daily budget is inside the emergency reserve.
    pub async fn freshness_threshold(&self, now: DateTime<Utc>, estimated_cost: Option<f64>) -> u64 {
        let base = self.base_threshold(now, estimated_cost);
        let tight = self
            .budget_snapshot_at(now)
            .await
            .is_some_and(|state| state.is_tight());
        if tight { base.saturating_mul(2) } else { base }
    }

    /// Whether a value generated at `last_generated_at` may be reused now
    pub async fn should_use_cache(
        &self,
        last_generated_at: DateTime<Utc>,
        estimated_cost: Option<f64>,
    ) -> bool {
        self.cache_decision_at(last_generated_at, estimated_cost, Utc::now())
            .await
            .reuse
    }

    /// Full freshness decision with the threshold applied and the reason
    pub async fn cache_decision_at(
        &self,
        last_generated_at: DateTime<Utc>,
        estimated_cost: Option<f64>,
        now: DateTime<Utc>,
    ) -> CacheFreshnessDecision {
        let budget = self.budget_snapshot_at(now).await;
        self.freshness_decision(last_generated_at, estimated_cost, now, budget.as_ref())
    }

    /// Freshness decision against an already-read budget state
    ///
    /// An unreadable budget (`None`) never widens the threshold.
    pub fn freshness_decision(
        &self,
        last_generated_at: DateTime<Utc>,
        estimated_cost: Option<f64>,
        now: DateTime<Utc>,
        budget: Option<&BudgetState>,
    ) -> CacheFreshnessDecision {
        // Clock skew can put the generation time ahead of us
        let age = (now - last_generated_at).num_seconds().max(0) as u64;
        let session = self.policy.session_at(now);
        let base = self.base_threshold(now, estimated_cost);

        if age < base {
            return CacheFreshnessDecision {
                reuse: true,
                threshold_seconds: base,
                reason: format!("age {}s within {} threshold {}s", age, session, base),
            };
        }

        if budget.is_some_and(|state| state.is_tight()) {
            let widened = base.saturating_mul(2);
            if age < widened {
                return CacheFreshnessDecision {
                    reuse: true,
                    threshold_seconds: widened,
                    reason: format!(
                        "age {}s within budget-widened threshold {}s",
                        age, widened
                    ),
                };
            }
            return CacheFreshnessDecision {
                reuse: false,
                threshold_seconds: widened,
                reason: format!("age {}s exceeds budget-widened threshold {}s", age, widened),
            };
        }

        CacheFreshnessDecision {
            reuse: false,
            threshold_seconds: base,
            reason: format!("age {}s exceeds {} threshold {}s", age, session, base),
        }
    }

    /// Append a usage record; a sink failure is logged, never raised
    pub async fn record_usage(&self, record: &UsageRecord) {
        if let Err(e) = self.ledger.append(record).await {
            warn!(
                "Failed to record ${:.4} spend for {}: {}",
                record.cost, record.request_kind, e
            );
        }
    }

    /// Spend totals for reporting
    pub async fn spend_summary(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        self.ledger.aggregate(filter).await
    }
}
