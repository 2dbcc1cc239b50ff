//! Governance facade configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Pipeline-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Serve the stale cached value instead of failing when the budget denies generation
    #[serde(default = "default_true")]
    pub serve_stale_on_budget_denial: bool,
    /// Provider name recorded on usage records
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            serve_stale_on_budget_denial: true,
            provider: default_provider(),
        }
    }
}
