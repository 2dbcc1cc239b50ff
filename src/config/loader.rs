//! Configuration loading utilities
//!
//! This module applies environment overrides on top of a loaded configuration.

use super::Config;
use crate::utils::error::{GovernanceError, Result};
use std::str::FromStr;
use tracing::debug;

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| GovernanceError::Config(format!("Invalid {}: {}", name, e)))
}

impl Config {
    /// Apply environment overrides using the given lookup
    ///
    /// The lookup is injected so overrides can be exercised without touching
    /// the process environment.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Applying environment overrides");

        // Redis configuration
        if let Some(redis_url) = lookup("REDIS_URL") {
            self.storage.redis.url = redis_url;
            self.storage.redis.enabled = true;
        }

        // Budget configuration
        if let Some(daily) = lookup("GOVERNANCE_DAILY_BUDGET") {
            self.budget.daily_budget = parse_var("GOVERNANCE_DAILY_BUDGET", &daily)?;
        }
        if let Some(monthly) = lookup("GOVERNANCE_MONTHLY_BUDGET") {
            self.budget.monthly_budget = parse_var("GOVERNANCE_MONTHLY_BUDGET", &monthly)?;
        }
        if let Some(reserve) = lookup("GOVERNANCE_EMERGENCY_RESERVE") {
            self.budget.emergency_reserve = parse_var("GOVERNANCE_EMERGENCY_RESERVE", &reserve)?;
        }

        // One switch for every fail-open decision
        if let Some(fail_open) = lookup("GOVERNANCE_FAIL_OPEN") {
            let fail_open: bool = parse_var("GOVERNANCE_FAIL_OPEN", &fail_open)?;
            self.rate_limit.fail_open = fail_open;
            self.budget.fail_open = fail_open;
            self.quota.fail_open = fail_open;
        }

        // Logging configuration
        if let Some(level) = lookup("GOVERNANCE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }
}
