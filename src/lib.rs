//! # meterline
//!
//! Resource governance for metered AI analysis services: decides whether a
//! request may proceed, whether a previously generated answer may be reused,
//! and records what was spent.
//!
//! ## Features
//!
//! - **Sliding-window rate limiting**: per-scope limits on Redis, with an
//!   in-process fallback when the shared store is slow or down
//! - **Cache TTL policy**: per-category lifetimes adjusted for volatility and
//!   market session
//! - **Spend budgets**: daily and monthly ceilings with an emergency reserve
//! - **Subscription quotas**: daily per-caller allowances by plan tier
//! - **One ledger**: budget and quota both read the same usage records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meterline::{
//!     CallerIdentity, CompletionOutcome, Complexity, Config, DataCategory, GenerationPlan,
//!     GenerationRequest, GovernanceFacade, GovernanceRequest, QuotaType,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/governance.yaml").await?;
//!     meterline::init_tracing(&config.logging)?;
//!     let engine = GovernanceFacade::builder(config).connect().await.build()?;
//!
//!     let request = GovernanceRequest::new(
//!         CallerIdentity::user("alice", "203.0.113.9"),
//!         "analysis",
//!         "/api/analysis",
//!         QuotaType::Analysis,
//!     )
//!     .with_generation(GenerationRequest::new(
//!         DataCategory::Analysis,
//!         Complexity::Medium,
//!         "stock_analysis",
//!     ));
//!
//!     let ticket = engine.admit(request).await?;
//!     if let GenerationPlan::Generate { store_ttl_secs, .. } = ticket.plan() {
//!         println!("generate and cache for {}s", store_ttl_secs);
//!     }
//!     engine.complete(ticket, CompletionOutcome::success(850)).await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GovernanceError, Result};
pub use utils::logging::init_tracing;

pub use core::cache_policy::{CacheTtlPolicy, DataCategory, MarketSession, TtlContext, Volatility};
pub use core::cost::{BudgetState, CacheFreshnessDecision, Complexity, CostManager};
pub use core::governance::{
    AdmissionTicket, CompletionOutcome, GenerationPlan, GenerationRequest, GovernanceBuilder,
    GovernanceFacade, GovernanceRequest, GovernanceStats,
};
pub use core::keys::{CallerIdentity, RateKey};
pub use core::quota::{PlanStore, QuotaCheck, QuotaInfo, QuotaService, QuotaType, SubscriptionPlan};
pub use core::rate_limiter::{RateLimitResult, RateLimiter, StoreBackend, WindowStore};
pub use storage::ledger::{
    BoundedLedger, InMemoryLedger, LedgerStats, UsageAggregate, UsageFilter, UsageLedger,
    UsageRecord,
};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
