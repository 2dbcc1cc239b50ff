//! Subscription quota configuration

use super::*;
use crate::core::quota::SubscriptionPlan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quota service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Limits applied when a caller has no active subscription
    #[serde(default = "default_plan")]
    pub default_plan: SubscriptionPlan,
    /// Named tiers that subscriptions refer to
    #[serde(default = "default_plans")]
    pub plans: HashMap<String, SubscriptionPlan>,
    /// Grant the request when usage cannot be read
    #[serde(default = "default_true")]
    pub fail_open: bool,
}

fn default_plan() -> SubscriptionPlan {
    SubscriptionPlan::new("free", 100, 5)
}

fn default_plans() -> HashMap<String, SubscriptionPlan> {
    [
        default_plan(),
        SubscriptionPlan::new("basic", 1_000, 25),
        SubscriptionPlan::new("pro", 10_000, 100),
        SubscriptionPlan::new("enterprise", 100_000, 1_000),
    ]
    .into_iter()
    .map(|plan| (plan.name.clone(), plan))
    .collect()
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_plan: default_plan(),
            plans: default_plans(),
            fail_open: true,
        }
    }
}

impl QuotaConfig {
    /// Look up a named tier
    pub fn plan(&self, name: &str) -> Option<&SubscriptionPlan> {
        self.plans.get(name)
    }
}
