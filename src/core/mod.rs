//! Core governance logic
//!
//! Each component can be used on its own; [`governance::GovernanceFacade`]
//! wires them into the per-request pipeline.

pub mod cache_policy; // TTLs and market sessions
pub mod cost; // Spend budgets and freshness
pub mod governance;
pub mod keys;
pub mod quota; // Daily subscription quotas
pub mod rate_limiter; // Sliding-window rate limiting

pub use governance::{GovernanceBuilder, GovernanceFacade};
