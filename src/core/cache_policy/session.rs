//! Market session classification

use super::types::MarketSession;
use crate::config::models::cache::MarketHoursConfig;
use crate::utils::error::{GovernanceError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc, Weekday};

/// Exchange trading hours at a fixed UTC offset
///
/// Daylight saving is not modeled; deployments adjust `utc_offset_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    offset: FixedOffset,
    open: NaiveTime,
    close: NaiveTime,
}

impl MarketHours {
    pub fn new(offset: FixedOffset, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            offset,
            open,
            close,
        }
    }

    /// Build from configuration, rejecting unparsable times or offsets
    pub fn from_config(config: &MarketHoursConfig) -> Result<Self> {
        let (open, close) = config.parse_times().map_err(GovernanceError::Config)?;
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            GovernanceError::config(format!(
                "Invalid market UTC offset: {} minutes",
                config.utc_offset_minutes
            ))
        })?;
        Ok(Self::new(offset, open, close))
    }

    /// Classify an instant
    pub fn session_at(&self, now: DateTime<Utc>) -> MarketSession {
        let local = now.with_timezone(&self.offset);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketSession::Weekend;
        }

        let time = local.time();
        if time >= self.open && time < self.close {
            MarketSession::Trading
        } else {
            MarketSession::OffHours
        }
    }
}
