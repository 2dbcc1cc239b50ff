//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.
//!
//! - `limit_validators`: rate limit and quota validators
//! - `policy_validators`: cache policy and budget validators
//! - `storage_validators`: storage-related validators
//! - `tests`: Test suite for all validators

mod limit_validators;
mod policy_validators;
mod storage_validators;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
