//! Quota types

use crate::utils::error::GovernanceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request classification with its own daily limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    /// Plain data API calls
    Api,
    /// Paid AI analysis requests
    Analysis,
}

impl QuotaType {
    pub const ALL: [QuotaType; 2] = [QuotaType::Api, QuotaType::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaType::Api => "api",
            QuotaType::Analysis => "analysis",
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotaType {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(QuotaType::Api),
            "analysis" => Ok(QuotaType::Analysis),
            _ => Err(GovernanceError::InvalidQuotaType(s.to_string())),
        }
    }
}

/// A subscription tier and its daily limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub name: String,
    pub api_daily: u64,
    pub analysis_daily: u64,
}

impl SubscriptionPlan {
    pub fn new(name: impl Into<String>, api_daily: u64, analysis_daily: u64) -> Self {
        Self {
            name: name.into(),
            api_daily,
            analysis_daily,
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits {
            api_daily: self.api_daily,
            analysis_daily: self.analysis_daily,
        }
    }
}

/// Daily limits per quota type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaLimits {
    pub api_daily: u64,
    pub analysis_daily: u64,
}

impl QuotaLimits {
    pub fn limit(&self, quota_type: QuotaType) -> u64 {
        match quota_type {
            QuotaType::Api => self.api_daily,
            QuotaType::Analysis => self.analysis_daily,
        }
    }
}

/// Requests counted today per quota type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub api_used: u64,
    pub analysis_used: u64,
}

impl QuotaUsage {
    pub fn used(&self, quota_type: QuotaType) -> u64 {
        match quota_type {
            QuotaType::Api => self.api_used,
            QuotaType::Analysis => self.analysis_used,
        }
    }
}

/// Caller-facing quota snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaInfo {
    /// Quota type as requested
    pub quota_type: String,
    pub usage: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Next UTC midnight
    pub resets_at: DateTime<Utc>,
    /// Plan the limit came from
    pub plan: String,
    /// Set when the check itself could not be answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a quota check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaCheck {
    pub has_quota: bool,
    pub info: QuotaInfo,
}
