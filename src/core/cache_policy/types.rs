//! Cache policy types

use crate::utils::error::GovernanceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of cached market data, each with its own base TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Live price quote
    Quote,
    /// Intraday bars and indicators
    Intraday,
    /// News headlines and digests
    News,
    /// Generated analysis
    Analysis,
    /// Company fundamentals
    Fundamentals,
    /// Regulatory filings
    Filings,
}

impl DataCategory {
    /// Every category, shortest-lived first
    pub const ALL: [DataCategory; 6] = [
        DataCategory::Quote,
        DataCategory::Intraday,
        DataCategory::News,
        DataCategory::Analysis,
        DataCategory::Fundamentals,
        DataCategory::Filings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Quote => "quote",
            DataCategory::Intraday => "intraday",
            DataCategory::News => "news",
            DataCategory::Analysis => "analysis",
            DataCategory::Fundamentals => "fundamentals",
            DataCategory::Filings => "filings",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        DataCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| GovernanceError::InvalidCategory(s.to_string()))
    }
}

/// Market volatility hint supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    High,
    #[default]
    Normal,
    Low,
}

/// Optional context adjusting a base TTL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlContext {
    pub volatility: Option<Volatility>,
}

impl TtlContext {
    pub fn with_volatility(volatility: Volatility) -> Self {
        Self {
            volatility: Some(volatility),
        }
    }
}

/// Trading session an instant falls into, in exchange-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    /// Weekday between open and close
    Trading,
    /// Weekday outside trading hours
    OffHours,
    /// Saturday or Sunday
    Weekend,
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSession::Trading => write!(f, "trading"),
            MarketSession::OffHours => write!(f, "off_hours"),
            MarketSession::Weekend => write!(f, "weekend"),
        }
    }
}
