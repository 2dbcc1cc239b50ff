//! Budget tracking
//!
//! Cost estimation for paid generation, affordability against daily and
//! monthly budgets, and the budget-aware cache freshness threshold.

mod manager;
mod types;


pub use manager::CostManager;
pub use types::{BudgetState, CacheFreshnessDecision, Complexity};
