//! Storage layer for the governance engine
//!
//! This module provides the usage ledger and the distributed backends.

/// Usage ledger
pub mod ledger;
/// Redis backends
#[cfg(feature = "redis")]
pub mod redis;
