//! Cost and budget types

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much work a generation request takes, scaling its base cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    /// Built-in cost factor, used when the configured table has no entry
    pub fn default_multiplier(&self) -> f64 {
        match self {
            Complexity::Low => 0.7,
            Complexity::Medium => 1.0,
            Complexity::High => 1.5,
            Complexity::VeryHigh => 2.0,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
            Complexity::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// Spend against the budget, derived from ledger aggregates at check time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetState {
    pub daily_spent: f64,
    pub monthly_spent: f64,
    pub daily_limit: f64,
    pub monthly_limit: f64,
    pub emergency_reserve: f64,
}

impl BudgetState {
    pub fn daily_remaining(&self) -> f64 {
        (self.daily_limit - self.daily_spent).max(0.0)
    }

    pub fn monthly_remaining(&self) -> f64 {
        (self.monthly_limit - self.monthly_spent).max(0.0)
    }

    /// Fraction of the daily budget spent, 0.0 to 1.0+
    pub fn daily_utilization(&self) -> f64 {
        if self.daily_limit <= 0.0 {
            return 1.0;
        }
        self.daily_spent / self.daily_limit
    }

    /// Whether remaining daily budget has dropped below the emergency reserve
    pub fn is_tight(&self) -> bool {
        self.daily_remaining() < self.emergency_reserve
    }

    /// Whether spending `amount` now is within budget
    ///
    /// Inside the emergency reserve a single request may take at most half of
    /// what remains.
    pub fn can_afford(&self, amount: f64) -> bool {
        if self.daily_spent + amount > self.daily_limit {
            return false;
        }
        if self.monthly_spent + amount > self.monthly_limit {
            return false;
        }
        if self.is_tight() && amount > self.daily_remaining() / 2.0 {
            return false;
        }
        true
    }
}

/// Whether a previously generated value may be reused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheFreshnessDecision {
    pub reuse: bool,
    /// Threshold the age was compared against
    pub threshold_seconds: u64,
    pub reason: String,
}
