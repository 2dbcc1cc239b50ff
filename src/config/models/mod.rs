//! Configuration data models
//!
//! This module defines all configuration structures used throughout the engine.

#![allow(missing_docs)]

pub mod budget;
pub mod cache;
pub mod governance;
pub mod logging;
pub mod quota;
pub mod rate_limit;
pub mod storage;

// Re-export all configuration types
pub use budget::*;
pub use cache::*;
pub use governance::*;
pub use logging::*;
pub use quota::*;
pub use rate_limit::*;
pub use storage::*;

/// Default value helpers shared by serde attributes
pub fn default_true() -> bool {
    true
}

/// Timeout for a single distributed-store round trip
pub fn default_store_timeout_ms() -> u64 {
    50
}

/// Timeout for a single usage ledger read or append
pub fn default_ledger_timeout_ms() -> u64 {
    50
}

/// Interval between sweeps of the in-process window store
pub fn default_cleanup_interval_secs() -> u64 {
    60
}

pub fn default_limit() -> u32 {
    100
}

pub fn default_window_seconds() -> u64 {
    60
}

pub fn default_daily_budget() -> f64 {
    100.0
}

pub fn default_monthly_budget() -> f64 {
    2_000.0
}

pub fn default_emergency_reserve() -> f64 {
    10.0
}

pub fn default_cost() -> f64 {
    0.02
}

pub fn default_high_cost_boundary() -> f64 {
    0.10
}

pub fn default_high_cost_ceiling_secs() -> u64 {
    600 // 10 minutes
}

pub fn default_high_volatility_factor() -> f64 {
    0.5
}

pub fn default_low_volatility_factor() -> f64 {
    1.5
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_key_prefix() -> String {
    "meterline".to_string()
}

pub fn default_provider() -> String {
    "anthropic".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
