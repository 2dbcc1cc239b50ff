//! Per-caller daily quota enforcement

use super::plans::PlanStore;
use super::types::{QuotaCheck, QuotaInfo, QuotaLimits, QuotaType, QuotaUsage, SubscriptionPlan};
use crate::config::models::quota::QuotaConfig;
use crate::core::keys::CallerIdentity;
use crate::storage::ledger::{UsageFilter, UsageLedger, UsageRecord, start_of_day};
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Daily quota service
///
/// Usage is never counted in place: every read aggregates today's ledger
/// records for the caller. Anonymous callers get the default tier, counted
/// per remote address.
#[derive(Clone)]
pub struct QuotaService {
    config: QuotaConfig,
    plans: Arc<dyn PlanStore>,
    ledger: Arc<dyn UsageLedger>,
}

impl QuotaService {
    pub fn new(config: QuotaConfig, plans: Arc<dyn PlanStore>, ledger: Arc<dyn UsageLedger>) -> Self {
        Self {
            config,
            plans,
            ledger,
        }
    }

    /// Active plan for a caller, the default tier when there is none
    pub async fn plan_for(&self, caller_id: Option<&str>) -> SubscriptionPlan {
        let Some(caller_id) = caller_id else {
            return self.config.default_plan.clone();
        };

        match self.plans.active_plan(caller_id).await {
            Ok(Some(name)) => match self.config.plan(&name) {
                Some(plan) => plan.clone(),
                None => {
                    warn!(
                        "Caller {} subscribed to unknown plan '{}', using default tier",
                        caller_id, name
                    );
                    self.config.default_plan.clone()
                }
            },
            Ok(None) => self.config.default_plan.clone(),
            Err(e) => {
                warn!(
                    "Plan lookup failed for {}, using default tier: {}",
                    caller_id, e
                );
                self.config.default_plan.clone()
            }
        }
    }

    /// Daily limits for a caller
    pub async fn quotas_for(&self, caller_id: Option<&str>) -> QuotaLimits {
        self.plan_for(caller_id).await.limits()
    }

    /// Requests the caller made today, per quota type
    pub async fn usage_today(&self, caller_id: &str) -> Result<QuotaUsage> {
        self.usage_today_at(caller_id, Utc::now()).await
    }

    pub async fn usage_today_at(&self, caller_id: &str, now: DateTime<Utc>) -> Result<QuotaUsage> {
        self.usage_matching(&UsageFilter::day_of(now).for_caller(caller_id))
            .await
    }

    /// Anonymous requests made today from one address
    pub async fn address_usage_today_at(
        &self,
        client_addr: &str,
        now: DateTime<Utc>,
    ) -> Result<QuotaUsage> {
        self.usage_matching(&UsageFilter::day_of(now).for_address(client_addr))
            .await
    }

    async fn usage_matching(&self, filter: &UsageFilter) -> Result<QuotaUsage> {
        let aggregate = self.ledger.aggregate(filter).await?;
        Ok(QuotaUsage {
            api_used: aggregate.count_for(QuotaType::Api),
            analysis_used: aggregate.count_for(QuotaType::Analysis),
        })
    }

    /// Check a quota given by name
    ///
    /// An unknown name never grants quota; the answer carries the error.
    pub async fn check_quota(&self, caller_id: Option<&str>, quota_type: &str) -> QuotaCheck {
        self.check_quota_at(caller_id, quota_type, Utc::now()).await
    }

    pub async fn check_quota_at(
        &self,
        caller_id: Option<&str>,
        quota_type: &str,
        now: DateTime<Utc>,
    ) -> QuotaCheck {
        match quota_type.parse::<QuotaType>() {
            Ok(quota_type) => self.check_at(caller_id, quota_type, now).await,
            Err(e) => {
                debug!("Rejected quota check for unknown type '{}'", quota_type);
                let plan = self.plan_for(caller_id).await;
                QuotaCheck {
                    has_quota: false,
                    info: QuotaInfo {
                        quota_type: quota_type.to_string(),
                        usage: 0,
                        limit: 0,
                        remaining: 0,
                        resets_at: next_reset(now),
                        plan: plan.name,
                        error: Some(e.to_string()),
                    },
                }
            }
        }
    }

    /// Check whether the caller has quota left today
    pub async fn check(&self, caller_id: Option<&str>, quota_type: QuotaType) -> QuotaCheck {
        self.check_at(caller_id, quota_type, Utc::now()).await
    }

    /// Check by user id alone
    ///
    /// Without an address there is nothing to count anonymous usage
    /// against, so `None` reports zero usage; governed requests go through
    /// [`check_caller_at`](Self::check_caller_at).
    pub async fn check_at(
        &self,
        caller_id: Option<&str>,
        quota_type: QuotaType,
        now: DateTime<Utc>,
    ) -> QuotaCheck {
        let plan = self.plan_for(caller_id).await;
        let usage = match caller_id {
            None => Ok(QuotaUsage::default()),
            Some(caller_id) => self.usage_today_at(caller_id, now).await,
        };
        self.evaluate(caller_id.unwrap_or("anonymous"), plan, usage, quota_type, now)
    }

    /// Check a full caller identity
    pub async fn check_caller(&self, caller: &CallerIdentity, quota_type: QuotaType) -> QuotaCheck {
        self.check_caller_at(caller, quota_type, Utc::now()).await
    }

    pub async fn check_caller_at(
        &self,
        caller: &CallerIdentity,
        quota_type: QuotaType,
        now: DateTime<Utc>,
    ) -> QuotaCheck {
        match caller.user_id.as_deref() {
            Some(_) => self.check_at(caller.user_id.as_deref(), quota_type, now).await,
            None => {
                let plan = self.config.default_plan.clone();
                let usage = self
                    .address_usage_today_at(&caller.remote_addr, now)
                    .await;
                self.evaluate(&caller.remote_addr, plan, usage, quota_type, now)
            }
        }
    }

    fn evaluate(
        &self,
        subject: &str,
        plan: SubscriptionPlan,
        usage: Result<QuotaUsage>,
        quota_type: QuotaType,
        now: DateTime<Utc>,
    ) -> QuotaCheck {
        let limit = plan.limits().limit(quota_type);
        let resets_at = next_reset(now);

        match usage {
            Ok(usage) => {
                let usage = usage.used(quota_type);
                let has_quota = usage < limit;
                if !has_quota {
                    debug!(
                        "Daily {} quota exhausted for {}: {}/{}",
                        quota_type, subject, usage, limit
                    );
                }
                QuotaCheck {
                    has_quota,
                    info: QuotaInfo {
                        quota_type: quota_type.to_string(),
                        usage,
                        limit,
                        remaining: limit.saturating_sub(usage),
                        resets_at,
                        plan: plan.name,
                        error: None,
                    },
                }
            }
            Err(e) => {
                warn!(
                    "Quota usage read failed for {}, fail_open={}: {}",
                    subject, self.config.fail_open, e
                );
                QuotaCheck {
                    has_quota: self.config.fail_open,
                    info: QuotaInfo {
                        quota_type: quota_type.to_string(),
                        usage: 0,
                        limit,
                        remaining: limit,
                        resets_at,
                        plan: plan.name,
                        error: Some("usage unavailable".to_string()),
                    },
                }
            }
        }
    }

    /// Append a usage record; a sink failure is logged, never raised
    pub async fn record_usage(&self, record: &UsageRecord) {
        if let Err(e) = self.ledger.append(record).await {
            warn!(
                "Failed to record {} usage for {:?}: {}",
                record.quota_type, record.caller_id, e
            );
        }
    }
}

/// Next UTC midnight after `now`
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) + Duration::days(1)
}
