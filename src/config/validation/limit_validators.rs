//! Rate limit and quota validators

use super::Validate;
use crate::config::models::*;
use crate::core::quota::SubscriptionPlan;
use tracing::debug;

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating rate limit configuration");

        if self.store_timeout_ms == 0 {
            return Err("Store timeout must be greater than 0".to_string());
        }

        if self.store_timeout_ms > 5_000 {
            return Err("Store timeout should not exceed 5000ms".to_string());
        }

        if self.cleanup_interval_secs == 0 {
            return Err("Cleanup interval must be greater than 0".to_string());
        }

        for (scope, limit) in &self.scopes {
            if scope.is_empty() {
                return Err("Scope name cannot be empty".to_string());
            }
            limit
                .validate()
                .map_err(|e| format!("Scope '{}': {}", scope, e))?;
        }

        Ok(())
    }
}

impl Validate for ScopeLimit {
    fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("Limit must be greater than 0".to_string());
        }

        if self.window_seconds == 0 {
            return Err("Window must be greater than 0 seconds".to_string());
        }

        Ok(())
    }
}

impl Validate for QuotaConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating quota configuration");

        self.default_plan.validate()?;

        for (name, plan) in &self.plans {
            if name != &plan.name {
                return Err(format!(
                    "Plan key '{}' does not match plan name '{}'",
                    name, plan.name
                ));
            }
            plan.validate()?;
        }

        Ok(())
    }
}

impl Validate for SubscriptionPlan {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Plan name cannot be empty".to_string());
        }

        if self.api_daily == 0 {
            return Err(format!("Plan '{}' must allow at least one API call", self.name));
        }

        Ok(())
    }
}
