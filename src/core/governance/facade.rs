//! Governance pipeline

use super::stats::{FacadeCounters, GovernanceStats};
use super::types::{AdmissionTicket, CompletionOutcome, GenerationPlan, GenerationRequest, GovernanceRequest};
use crate::config::models::governance::GovernanceConfig;
use crate::core::cost::CostManager;
use crate::core::quota::QuotaService;
use crate::core::rate_limiter::RateLimiter;
use crate::storage::ledger::{BoundedLedger, UsageRecord, UsageStatus};
use crate::utils::error::{GovernanceError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Background task aborted when the last facade clone is dropped
pub(super) struct BackgroundTask(JoinHandle<()>);

impl BackgroundTask {
    pub(super) fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs every inbound request through rate limit, quota, freshness and
/// budget checks, and records usage on completion
#[derive(Clone)]
pub struct GovernanceFacade {
    config: GovernanceConfig,
    limiter: RateLimiter,
    quotas: QuotaService,
    costs: CostManager,
    ledger: Arc<BoundedLedger>,
    cleanup: Option<Arc<BackgroundTask>>,
    stats: Arc<FacadeCounters>,
}

impl GovernanceFacade {
    /// Assemble from parts; `quotas` and `costs` should share `ledger`
    pub(super) fn new(
        config: GovernanceConfig,
        limiter: RateLimiter,
        quotas: QuotaService,
        costs: CostManager,
        ledger: Arc<BoundedLedger>,
        cleanup: Option<BackgroundTask>,
    ) -> Self {
        Self {
            config,
            limiter,
            quotas,
            costs,
            ledger,
            cleanup: cleanup.map(Arc::new),
            stats: Arc::new(FacadeCounters::default()),
        }
    }

    /// Admit a request, or say why it is refused
    ///
    /// A rate-limit slot taken here is kept even when a later check refuses
    /// the request.
    pub async fn admit(&self, request: GovernanceRequest) -> Result<AdmissionTicket> {
        self.admit_at(request, Utc::now()).await
    }

    pub async fn admit_at(
        &self,
        request: GovernanceRequest,
        now: DateTime<Utc>,
    ) -> Result<AdmissionTicket> {
        let identifier = request.caller.rate_identifier();
        let rate_limit = self
            .limiter
            .admit_scope_at(&request.scope, &identifier, now)
            .await;
        if !rate_limit.allowed {
            FacadeCounters::incr(&self.stats.rate_limited);
            return Err(GovernanceError::RateLimited {
                scope: request.scope.clone(),
                limit: rate_limit.limit,
                retry_after_secs: rate_limit.retry_after_secs.unwrap_or(1),
                reset_at: rate_limit.reset_at,
            });
        }

        let quota = self
            .quotas
            .check_caller_at(&request.caller, request.quota_type, now)
            .await;
        if !quota.has_quota {
            FacadeCounters::incr(&self.stats.quota_denied);
            return Err(GovernanceError::QuotaExceeded(quota.info));
        }

        let plan = match &request.generation {
            None => GenerationPlan::NoGeneration,
            Some(generation) => self.plan_generation(generation, now).await?,
        };

        debug!(
            "Admitted {} request from {} on scope {}: {:?}",
            request.quota_type, identifier, request.scope, plan
        );
        FacadeCounters::incr(&self.stats.admitted);

        Ok(AdmissionTicket {
            request,
            plan,
            rate_limit,
            quota: quota.info,
            admitted_at: now,
        })
    }

    /// Reuse when fresh, else generate when affordable, else serve stale
    async fn plan_generation(
        &self,
        generation: &GenerationRequest,
        now: DateTime<Utc>,
    ) -> Result<GenerationPlan> {
        let estimated_cost = self
            .costs
            .estimate_cost(&generation.request_kind, generation.complexity);
        // One read serves both the freshness and the affordability check
        let budget = self.costs.budget_snapshot_at(now).await;

        if let Some(generated_at) = generation.last_generated_at {
            let decision = self.costs.freshness_decision(
                generated_at,
                Some(estimated_cost),
                now,
                budget.as_ref(),
            );
            if decision.reuse {
                return Ok(GenerationPlan::ServeCached { decision });
            }
        }

        match self.costs.affordability(estimated_cost, budget.as_ref()) {
            Ok(()) => Ok(GenerationPlan::Generate {
                estimated_cost,
                store_ttl_secs: self
                    .costs
                    .policy()
                    .ttl_for(generation.category, generation.context.as_ref()),
            }),
            Err(e) => {
                FacadeCounters::incr(&self.stats.budget_denied);
                if generation.last_generated_at.is_some() && self.config.serve_stale_on_budget_denial
                {
                    debug!("{}; serving stale {} value", e, generation.category);
                    Ok(GenerationPlan::ServeStale { estimated_cost })
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Record usage for an admitted request
    ///
    /// Consumes the ticket. Cached and stale answers are recorded at zero
    /// cost but still count against the caller's quota.
    pub async fn complete(&self, ticket: AdmissionTicket, outcome: CompletionOutcome) {
        let AdmissionTicket {
            request,
            plan,
            admitted_at,
            ..
        } = ticket;

        let cost = match &plan {
            GenerationPlan::Generate { estimated_cost, .. } => {
                outcome.actual_cost.unwrap_or(match outcome.status {
                    UsageStatus::Success => *estimated_cost,
                    UsageStatus::Error => 0.0,
                })
            }
            _ => 0.0,
        };

        let request_kind = request
            .generation
            .as_ref()
            .map(|g| g.request_kind.clone())
            .unwrap_or_else(|| request.scope.clone());

        let mut record = UsageRecord::new(
            request.caller.user_id.clone(),
            self.config.provider.clone(),
            request.endpoint.clone(),
            request_kind,
            request.quota_type,
            cost,
        )
        .with_timestamp(admitted_at)
        .with_client_addr(request.caller.remote_addr.clone())
        .with_latency(outcome.latency_ms)
        .with_status(outcome.status);

        match plan {
            GenerationPlan::ServeCached { .. } => {
                record = record.cached();
                FacadeCounters::incr(&self.stats.served_from_cache);
            }
            GenerationPlan::ServeStale { .. } => {
                record = record.cached();
                FacadeCounters::incr(&self.stats.served_stale);
            }
            GenerationPlan::Generate { .. } => FacadeCounters::incr(&self.stats.generated),
            GenerationPlan::NoGeneration => {}
        }

        self.costs.record_usage(&record).await;
    }

    /// Counters since startup, including store fallbacks and ledger failures
    pub fn stats(&self) -> GovernanceStats {
        self.stats
            .snapshot(self.limiter.stats().fallbacks, self.ledger.stats())
    }

    /// Whether the local rate limit store is being swept in the background
    pub fn is_sweeping(&self) -> bool {
        self.cleanup.is_some()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn quotas(&self) -> &QuotaService {
        &self.quotas
    }

    pub fn costs(&self) -> &CostManager {
        &self.costs
    }
}
