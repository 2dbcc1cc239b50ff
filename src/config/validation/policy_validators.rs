//! Cache policy and budget validators

use super::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for CachePolicyConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating cache policy configuration");

        for (category, ttl) in &self.base_ttls {
            if *ttl == 0 {
                return Err(format!("TTL for {} must be greater than 0", category));
            }
        }

        if self.high_volatility_factor <= 0.0 || self.low_volatility_factor <= 0.0 {
            return Err("Volatility factors must be positive".to_string());
        }

        self.market_hours.validate()?;

        let sessions = &self.sessions;
        if sessions.trading_secs == 0 || sessions.off_hours_secs == 0 || sessions.weekend_secs == 0
        {
            return Err("Session thresholds must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for MarketHoursConfig {
    fn validate(&self) -> Result<(), String> {
        let (open, close) = self.parse_times()?;

        if open >= close {
            return Err("Market open must be before market close".to_string());
        }

        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err("UTC offset must be within +/-14 hours".to_string());
        }

        Ok(())
    }
}

impl Validate for BudgetConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating budget configuration");

        if self.daily_budget <= 0.0 {
            return Err("Daily budget must be positive".to_string());
        }

        if self.monthly_budget < self.daily_budget {
            return Err("Monthly budget cannot be below the daily budget".to_string());
        }

        if self.emergency_reserve < 0.0 {
            return Err("Emergency reserve cannot be negative".to_string());
        }

        if self.emergency_reserve > self.daily_budget {
            return Err("Emergency reserve cannot exceed the daily budget".to_string());
        }

        if self.default_cost < 0.0 {
            return Err("Default cost cannot be negative".to_string());
        }

        if let Some((kind, _)) = self.base_costs.iter().find(|(_, cost)| **cost < 0.0) {
            return Err(format!("Base cost for '{}' cannot be negative", kind));
        }

        if self.complexity_multipliers.values().any(|m| *m <= 0.0) {
            return Err("Complexity multipliers must be positive".to_string());
        }

        if self.high_cost_ceiling_secs == 0 {
            return Err("High-cost freshness ceiling must be greater than 0".to_string());
        }

        Ok(())
    }
}
