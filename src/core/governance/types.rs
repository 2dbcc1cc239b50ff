//! Request and decision types for the governance pipeline

use crate::core::cache_policy::{DataCategory, TtlContext};
use crate::core::cost::{CacheFreshnessDecision, Complexity};
use crate::core::keys::CallerIdentity;
use crate::core::quota::{QuotaInfo, QuotaType};
use crate::core::rate_limiter::RateLimitResult;
use crate::storage::ledger::UsageStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One inbound request to be governed
#[derive(Debug, Clone)]
pub struct GovernanceRequest {
    pub caller: CallerIdentity,
    /// Rate limit scope, looked up in the configured table
    pub scope: String,
    /// Endpoint recorded on the usage record
    pub endpoint: String,
    /// Daily quota the request consumes
    pub quota_type: QuotaType,
    /// Present when the request may trigger paid generation
    pub generation: Option<GenerationRequest>,
}

impl GovernanceRequest {
    pub fn new(
        caller: CallerIdentity,
        scope: impl Into<String>,
        endpoint: impl Into<String>,
        quota_type: QuotaType,
    ) -> Self {
        Self {
            caller,
            scope: scope.into(),
            endpoint: endpoint.into(),
            quota_type,
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: GenerationRequest) -> Self {
        self.generation = Some(generation);
        self
    }
}

/// Classification of a request that may need paid generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub category: DataCategory,
    pub complexity: Complexity,
    /// Key into the base cost table
    pub request_kind: String,
    /// When the cached value was produced, if one exists
    pub last_generated_at: Option<DateTime<Utc>>,
    pub context: Option<TtlContext>,
}

impl GenerationRequest {
    pub fn new(category: DataCategory, complexity: Complexity, request_kind: impl Into<String>) -> Self {
        Self {
            category,
            complexity,
            request_kind: request_kind.into(),
            last_generated_at: None,
            context: None,
        }
    }

    pub fn cached_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.last_generated_at = Some(generated_at);
        self
    }

    pub fn with_context(mut self, context: TtlContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// What the caller should do to answer an admitted request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum GenerationPlan {
    /// Plain request, nothing to generate
    NoGeneration,
    /// Cached value is fresh enough
    ServeCached { decision: CacheFreshnessDecision },
    /// Budget denied generation; serve the cached value as is
    ServeStale { estimated_cost: f64 },
    /// Generate and cache the result for `store_ttl_secs`
    Generate {
        estimated_cost: f64,
        store_ttl_secs: u64,
    },
}

impl GenerationPlan {
    /// Whether the caller answers from a previously generated value
    pub fn serves_cached(&self) -> bool {
        matches!(
            self,
            GenerationPlan::ServeCached { .. } | GenerationPlan::ServeStale { .. }
        )
    }

    pub fn estimated_cost(&self) -> f64 {
        match self {
            GenerationPlan::Generate { estimated_cost, .. } => *estimated_cost,
            _ => 0.0,
        }
    }
}

/// Proof of admission
///
/// Not `Clone`: handing it to [`complete`](super::GovernanceFacade::complete)
/// consumes it, so usage is recorded once per admitted request.
#[derive(Debug)]
pub struct AdmissionTicket {
    pub(super) request: GovernanceRequest,
    pub(super) plan: GenerationPlan,
    pub(super) rate_limit: RateLimitResult,
    pub(super) quota: QuotaInfo,
    pub(super) admitted_at: DateTime<Utc>,
}

impl AdmissionTicket {
    pub fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    pub fn request(&self) -> &GovernanceRequest {
        &self.request
    }

    pub fn rate_limit(&self) -> &RateLimitResult {
        &self.rate_limit
    }

    pub fn quota(&self) -> &QuotaInfo {
        &self.quota
    }

    pub fn admitted_at(&self) -> DateTime<Utc> {
        self.admitted_at
    }
}

/// How an admitted request finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOutcome {
    pub status: UsageStatus,
    pub latency_ms: u64,
    /// Provider-reported cost; the estimate is used when absent
    pub actual_cost: Option<f64>,
}

impl CompletionOutcome {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            status: UsageStatus::Success,
            latency_ms,
            actual_cost: None,
        }
    }

    pub fn failed(latency_ms: u64) -> Self {
        Self {
            status: UsageStatus::Error,
            latency_ms,
            actual_cost: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.actual_cost = Some(cost);
        self
    }
}
