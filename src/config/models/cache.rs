//! Cache freshness configuration

use super::*;
use crate::core::cache_policy::DataCategory;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cache TTL policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePolicyConfig {
    /// Base TTL in seconds per data category
    #[serde(default = "default_base_ttls")]
    pub base_ttls: HashMap<DataCategory, u64>,
    /// Multiplier applied under high volatility
    #[serde(default = "default_high_volatility_factor")]
    pub high_volatility_factor: f64,
    /// Multiplier applied under low volatility
    #[serde(default = "default_low_volatility_factor")]
    pub low_volatility_factor: f64,
    /// Exchange trading hours
    #[serde(default)]
    pub market_hours: MarketHoursConfig,
    /// Freshness thresholds per market session
    #[serde(default)]
    pub sessions: SessionThresholds,
}

impl Default for CachePolicyConfig {
    fn default() -> Self {
        Self {
            base_ttls: default_base_ttls(),
            high_volatility_factor: default_high_volatility_factor(),
            low_volatility_factor: default_low_volatility_factor(),
            market_hours: MarketHoursConfig::default(),
            sessions: SessionThresholds::default(),
        }
    }
}

fn default_base_ttls() -> HashMap<DataCategory, u64> {
    HashMap::from([
        (DataCategory::Quote, 60),
        (DataCategory::Intraday, 300),
        (DataCategory::News, 1_800),
        (DataCategory::Analysis, 3_600),
        (DataCategory::Fundamentals, 86_400),
        (DataCategory::Filings, 604_800),
    ])
}

/// Trading hours of the reference exchange, expressed in exchange-local time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketHoursConfig {
    /// Offset of exchange-local time from UTC in minutes
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Session open, `HH:MM`
    #[serde(default = "default_market_open")]
    pub open: String,
    /// Session close, `HH:MM`
    #[serde(default = "default_market_close")]
    pub close: String,
}

fn default_utc_offset_minutes() -> i32 {
    -300 // US Eastern (standard time)
}

fn default_market_open() -> String {
    "09:30".to_string()
}

fn default_market_close() -> String {
    "16:00".to_string()
}

impl Default for MarketHoursConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            open: default_market_open(),
            close: default_market_close(),
        }
    }
}

impl MarketHoursConfig {
    /// Parse the open/close times
    pub fn parse_times(&self) -> Result<(NaiveTime, NaiveTime), String> {
        let open = NaiveTime::parse_from_str(&self.open, "%H:%M")
            .map_err(|e| format!("Invalid market open '{}': {}", self.open, e))?;
        let close = NaiveTime::parse_from_str(&self.close, "%H:%M")
            .map_err(|e| format!("Invalid market close '{}': {}", self.close, e))?;
        Ok((open, close))
    }
}

/// Freshness thresholds in seconds for each market session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionThresholds {
    #[serde(default = "default_trading_secs")]
    pub trading_secs: u64,
    #[serde(default = "default_off_hours_secs")]
    pub off_hours_secs: u64,
    #[serde(default = "default_weekend_secs")]
    pub weekend_secs: u64,
}

fn default_trading_secs() -> u64 {
    900 // 15 minutes
}

fn default_off_hours_secs() -> u64 {
    14_400 // 4 hours
}

fn default_weekend_secs() -> u64 {
    86_400 // 24 hours
}

impl Default for SessionThresholds {
    fn default() -> Self {
        Self {
            trading_secs: default_trading_secs(),
            off_hours_secs: default_off_hours_secs(),
            weekend_secs: default_weekend_secs(),
        }
    }
}
