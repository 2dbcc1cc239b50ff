//! Spend budget configuration

use super::*;
use crate::core::cost::Complexity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Budget tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Daily spend ceiling in USD
    #[serde(default = "default_daily_budget")]
    pub daily_budget: f64,
    /// Monthly spend ceiling in USD
    #[serde(default = "default_monthly_budget")]
    pub monthly_budget: f64,
    /// Daily headroom below which spend is rationed
    #[serde(default = "default_emergency_reserve")]
    pub emergency_reserve: f64,
    /// Cost used for request kinds missing from `base_costs`
    #[serde(default = "default_cost")]
    pub default_cost: f64,
    /// Base cost in USD per request kind
    #[serde(default = "default_base_costs")]
    pub base_costs: HashMap<String, f64>,
    /// Cost multiplier per complexity level
    #[serde(default = "default_complexity_multipliers")]
    pub complexity_multipliers: HashMap<Complexity, f64>,
    /// Estimated cost above which freshness is capped
    #[serde(default = "default_high_cost_boundary")]
    pub high_cost_boundary: f64,
    /// Freshness cap in seconds for high-cost requests
    #[serde(default = "default_high_cost_ceiling_secs")]
    pub high_cost_ceiling_secs: u64,
    /// Treat the request as affordable when spend cannot be read
    #[serde(default = "default_true")]
    pub fail_open: bool,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_budget: default_daily_budget(),
            monthly_budget: default_monthly_budget(),
            emergency_reserve: default_emergency_reserve(),
            default_cost: default_cost(),
            base_costs: default_base_costs(),
            complexity_multipliers: default_complexity_multipliers(),
            high_cost_boundary: default_high_cost_boundary(),
            high_cost_ceiling_secs: default_high_cost_ceiling_secs(),
            fail_open: true,
        }
    }
}

fn default_base_costs() -> HashMap<String, f64> {
    HashMap::from([
        ("stock_analysis".to_string(), 0.05),
        ("portfolio_review".to_string(), 0.12),
        ("earnings_summary".to_string(), 0.04),
        ("news_digest".to_string(), 0.02),
        ("market_outlook".to_string(), 0.08),
    ])
}

fn default_complexity_multipliers() -> HashMap<Complexity, f64> {
    HashMap::from([
        (Complexity::Low, 0.7),
        (Complexity::Medium, 1.0),
        (Complexity::High, 1.5),
        (Complexity::VeryHigh, 2.0),
    ])
}

impl BudgetConfig {
    /// Base cost for a request kind
    pub fn base_cost(&self, request_kind: &str) -> Option<f64> {
        self.base_costs.get(request_kind).copied()
    }

    /// Multiplier for a complexity level, falling back to the built-in factor
    pub fn multiplier(&self, complexity: Complexity) -> f64 {
        self.complexity_multipliers
            .get(&complexity)
            .copied()
            .unwrap_or_else(|| complexity.default_multiplier())
    }
}
