//! Error handling for the governance engine
//!
//! This module defines all error types used throughout the engine.

#![allow(missing_docs)]

use crate::core::quota::QuotaInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the governance engine
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Main error type for the governance engine
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sliding-window admission denied
    #[error("Rate limit exceeded for scope '{scope}', retry after {retry_after_secs}s")]
    RateLimited {
        scope: String,
        limit: u32,
        retry_after_secs: u64,
        reset_at: DateTime<Utc>,
    },

    /// Daily subscription quota exhausted
    #[error("Daily {} quota exhausted ({}/{})", .0.quota_type, .0.usage, .0.limit)]
    QuotaExceeded(QuotaInfo),

    /// Paid generation would exceed the spend budget
    #[error(
        "Budget exceeded: estimated ${estimated_cost:.4} with ${daily_remaining:.4} left today"
    )]
    BudgetExceeded {
        estimated_cost: f64,
        daily_remaining: f64,
        monthly_remaining: f64,
    },

    /// Unknown quota type supplied by the caller
    #[error("Invalid quota type: {0}")]
    InvalidQuotaType(String),

    /// Unknown data category supplied by the caller
    #[error("Invalid data category: {0}")]
    InvalidCategory(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Distributed store or ledger did not answer in time
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Usage ledger errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Subscription plan lookup errors
    #[error("Plan store error: {0}")]
    PlanStore(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to pick a recovery path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limit or quota denial; retry later or upgrade
    Admission,
    /// Budget denial; serve a cached value or degrade
    Budget,
    /// Store/ledger trouble; recovered internally where possible
    Infrastructure,
    /// Bad caller input such as an unknown quota type
    InvalidInput,
    /// Misconfigured deployment
    Configuration,
}

impl GovernanceError {
    /// Classify the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            GovernanceError::RateLimited { .. } | GovernanceError::QuotaExceeded(_) => {
                ErrorCategory::Admission
            }
            GovernanceError::BudgetExceeded { .. } => ErrorCategory::Budget,
            GovernanceError::InvalidQuotaType(_)
            | GovernanceError::InvalidCategory(_)
            | GovernanceError::Validation(_) => ErrorCategory::InvalidInput,
            GovernanceError::Config(_) | GovernanceError::Yaml(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Infrastructure,
        }
    }

    /// HTTP status the outer layer should map this error to
    pub fn http_status(&self) -> u16 {
        match self {
            GovernanceError::RateLimited { .. } | GovernanceError::QuotaExceeded(_) => 429,
            GovernanceError::BudgetExceeded { .. } => 402,
            GovernanceError::InvalidQuotaType(_)
            | GovernanceError::InvalidCategory(_)
            | GovernanceError::Validation(_) => 400,
            GovernanceError::Timeout(_) => 503,
            #[cfg(feature = "redis")]
            GovernanceError::Redis(_) => 503,
            _ => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            GovernanceError::Config(_) => "CONFIG_ERROR",
            #[cfg(feature = "redis")]
            GovernanceError::Redis(_) => "STORE_ERROR",
            GovernanceError::Serialization(_) => "SERIALIZATION_ERROR",
            GovernanceError::Yaml(_) => "CONFIG_ERROR",
            GovernanceError::Io(_) => "IO_ERROR",
            GovernanceError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            GovernanceError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GovernanceError::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            GovernanceError::InvalidQuotaType(_) => "INVALID_QUOTA_TYPE",
            GovernanceError::InvalidCategory(_) => "INVALID_CATEGORY",
            GovernanceError::Validation(_) => "VALIDATION_ERROR",
            GovernanceError::Timeout(_) => "STORE_TIMEOUT",
            GovernanceError::Ledger(_) => "LEDGER_ERROR",
            GovernanceError::PlanStore(_) => "PLAN_STORE_ERROR",
            GovernanceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Seconds the caller should wait before retrying, if known
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GovernanceError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            GovernanceError::QuotaExceeded(info) => {
                let secs = (info.resets_at - Utc::now()).num_seconds();
                Some(secs.max(1) as u64)
            }
            _ => None,
        }
    }

    /// Whether the caller can recover (retry later, serve cached, upgrade)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Admission | ErrorCategory::Budget
        )
    }
}

/// Helper functions for creating specific errors
impl GovernanceError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn ledger<S: Into<String>>(message: S) -> Self {
        Self::Ledger(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

/// Standard error payload for the outer layer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaInfo>,
    pub timestamp: i64,
}

impl From<&GovernanceError> for ErrorResponse {
    fn from(err: &GovernanceError) -> Self {
        let quota = match err {
            GovernanceError::QuotaExceeded(info) => Some(info.clone()),
            _ => None,
        };

        // Infrastructure details stay internal
        let message = match err.category() {
            ErrorCategory::Infrastructure => "Internal governance error".to_string(),
            _ => err.to_string(),
        };

        Self {
            error: ErrorDetail {
                code: err.error_code().to_string(),
                message,
                category: err.category(),
                retry_after_secs: err.retry_after_secs(),
                quota,
                timestamp: Utc::now().timestamp(),
            },
        }
    }
}
