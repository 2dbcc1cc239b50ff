//! Governance facade
//!
//! The per-request pipeline: rate limit, quota, cache freshness, budget,
//! and usage recording on completion.

mod builder;
mod facade;
mod stats;
mod types;


pub use builder::GovernanceBuilder;
pub use facade::GovernanceFacade;
pub use stats::GovernanceStats;
pub use types::{
    AdmissionTicket, CompletionOutcome, GenerationPlan, GenerationRequest, GovernanceRequest,
};
