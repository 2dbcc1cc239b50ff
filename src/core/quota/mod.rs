//! Subscription quotas
//!
//! Daily per-caller limits scoped to a subscription plan, counted from the
//! usage ledger.

mod plans;
mod service;
mod types;


pub use plans::{InMemoryPlanStore, PlanStore};
pub use service::{QuotaService, next_reset};
pub use types::{QuotaCheck, QuotaInfo, QuotaLimits, QuotaType, QuotaUsage, SubscriptionPlan};

#[cfg(test)]
pub use plans::MockPlanStore;
