//! Subscription plan lookup

use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Source of active subscriptions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Name of the caller's active plan, if any
    async fn active_plan(&self, caller_id: &str) -> Result<Option<String>>;
}

/// Plan assignments held in memory
#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    assignments: DashMap<String, String>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a named plan to a caller, replacing any previous one
    pub fn assign(&self, caller_id: impl Into<String>, plan: impl Into<String>) {
        self.assignments.insert(caller_id.into(), plan.into());
    }

    /// Remove a caller's subscription
    pub fn revoke(&self, caller_id: &str) -> Option<String> {
        self.assignments.remove(caller_id).map(|(_, plan)| plan)
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn active_plan(&self, caller_id: &str) -> Result<Option<String>> {
        Ok(self
            .assignments
            .get(caller_id)
            .map(|plan| plan.value().clone()))
    }
}
