//! Integration tests for meterline
//!
//! These tests drive the public API with real in-process stores; the only
//! substitutes are stores that fail or stall on purpose.

pub mod budget_quota_tests;
pub mod config_tests;
pub mod governance_tests;
pub mod rate_limit_tests;
