//! TTL policy

use super::session::MarketHours;
use super::types::{DataCategory, MarketSession, TtlContext, Volatility};
use crate::config::models::cache::{CachePolicyConfig, SessionThresholds};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Fallback base TTL for a category missing from a custom table
const FALLBACK_TTL_SECS: u64 = 300;

/// Maps data categories to cache lifetimes
///
/// Every method is pure: the answer depends only on the configuration and the
/// arguments.
#[derive(Debug, Clone)]
pub struct CacheTtlPolicy {
    base_ttls: HashMap<DataCategory, u64>,
    high_volatility_factor: f64,
    low_volatility_factor: f64,
    hours: MarketHours,
    sessions: SessionThresholds,
}

impl CacheTtlPolicy {
    /// Create a policy from configuration
    pub fn new(config: &CachePolicyConfig) -> Result<Self> {
        Ok(Self {
            base_ttls: config.base_ttls.clone(),
            high_volatility_factor: config.high_volatility_factor,
            low_volatility_factor: config.low_volatility_factor,
            hours: MarketHours::from_config(&config.market_hours)?,
            sessions: config.sessions,
        })
    }

    /// Base TTL for a category, ignoring context
    pub fn base_ttl(&self, category: DataCategory) -> u64 {
        self.base_ttls
            .get(&category)
            .copied()
            .unwrap_or(FALLBACK_TTL_SECS)
    }

    /// TTL in seconds for a category, adjusted for volatility when supplied
    pub fn ttl_for(&self, category: DataCategory, context: Option<&TtlContext>) -> u64 {
        let base = self.base_ttl(category);

        let factor = match context.and_then(|ctx| ctx.volatility) {
            Some(Volatility::High) => self.high_volatility_factor,
            Some(Volatility::Low) => self.low_volatility_factor,
            Some(Volatility::Normal) | None => return base,
        };

        ((base as f64 * factor).round() as u64).max(1)
    }

    /// TTL for a category given by name
    pub fn ttl_for_name(&self, category: &str, context: Option<&TtlContext>) -> Result<u64> {
        let category = category.parse::<DataCategory>()?;
        Ok(self.ttl_for(category, context))
    }

    /// Session an instant falls into
    pub fn session_at(&self, now: DateTime<Utc>) -> MarketSession {
        self.hours.session_at(now)
    }

    /// Freshness threshold in seconds for a session
    pub fn session_threshold(&self, session: MarketSession) -> u64 {
        match session {
            MarketSession::Trading => self.sessions.trading_secs,
            MarketSession::OffHours => self.sessions.off_hours_secs,
            MarketSession::Weekend => self.sessions.weekend_secs,
        }
    }

    /// Freshness threshold in seconds for the session containing `now`
    pub fn threshold_at(&self, now: DateTime<Utc>) -> u64 {
        self.session_threshold(self.session_at(now))
    }
}
