//! Usage ledger records and queries

use crate::core::quota::QuotaType;
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a governed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Success,
    Error,
}

/// One append-only usage entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Caller, absent for anonymous requests
    pub caller_id: Option<String>,
    /// Remote address; anonymous quota is counted against it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_addr: Option<String>,
    /// Paid provider the request was attributed to
    pub provider: String,
    /// Endpoint or scope that served the request
    pub endpoint: String,
    /// Request kind used for cost estimation
    pub request_kind: String,
    /// Daily quota the request consumed
    pub quota_type: QuotaType,
    /// Spend in USD; zero when served from cache
    pub cost: f64,
    pub latency_ms: u64,
    pub status: UsageStatus,
    /// Whether the caller got a reused value
    pub served_from_cache: bool,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a successful, uncached record stamped now
    pub fn new(
        caller_id: Option<String>,
        provider: impl Into<String>,
        endpoint: impl Into<String>,
        request_kind: impl Into<String>,
        quota_type: QuotaType,
        cost: f64,
    ) -> Self {
        Self {
            caller_id,
            client_addr: None,
            provider: provider.into(),
            endpoint: endpoint.into(),
            request_kind: request_kind.into(),
            quota_type,
            cost,
            latency_ms: 0,
            status: UsageStatus::Success,
            served_from_cache: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_client_addr(mut self, client_addr: impl Into<String>) -> Self {
        self.client_addr = Some(client_addr.into());
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_status(mut self, status: UsageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn cached(mut self) -> Self {
        self.served_from_cache = true;
        self.cost = 0.0;
        self
    }
}

/// Selection of ledger records over a half-open interval `[since, until)`
#[derive(Debug, Clone, PartialEq)]
pub struct UsageFilter {
    pub caller_id: Option<String>,
    /// Anonymous requests from this address only
    pub client_addr: Option<String>,
    pub provider: Option<String>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl UsageFilter {
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            caller_id: None,
            client_addr: None,
            provider: None,
            since,
            until,
        }
    }

    /// The UTC day containing `now`
    pub fn day_of(now: DateTime<Utc>) -> Self {
        let start = start_of_day(now);
        Self::between(start, start + Duration::days(1))
    }

    /// The UTC calendar month containing `now`
    pub fn month_of(now: DateTime<Utc>) -> Self {
        let start = start_of_month(now);
        Self::between(start, shift_months(start, 1))
    }

    /// Whether the interval is exactly one UTC calendar month
    pub fn is_calendar_month(&self) -> bool {
        self.since == start_of_month(self.since) && self.until == shift_months(self.since, 1)
    }

    /// Whether both ends fall on UTC midnight
    pub fn is_day_aligned(&self) -> bool {
        self.since == start_of_day(self.since) && self.until == start_of_day(self.until)
    }

    pub fn for_caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    /// Anonymous requests from one address
    pub fn for_address(mut self, client_addr: impl Into<String>) -> Self {
        self.client_addr = Some(client_addr.into());
        self
    }

    pub fn for_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Whether a record falls inside this filter
    pub fn matches(&self, record: &UsageRecord) -> bool {
        if record.timestamp < self.since || record.timestamp >= self.until {
            return false;
        }
        if let Some(caller) = &self.caller_id {
            if record.caller_id.as_deref() != Some(caller.as_str()) {
                return false;
            }
        }
        if let Some(addr) = &self.client_addr {
            if record.caller_id.is_some() || record.client_addr.as_deref() != Some(addr.as_str()) {
                return false;
            }
        }
        if let Some(provider) = &self.provider {
            if &record.provider != provider {
                return false;
            }
        }
        true
    }
}

/// Midnight UTC at the start of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC on the first day of the month containing `now`
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| start_of_day(now))
}

/// First instant of the month `delta` months from the one starting at `start`
pub(crate) fn shift_months(start: DateTime<Utc>, delta: i32) -> DateTime<Utc> {
    let index = start.year() * 12 + start.month0() as i32 + delta;
    Utc.with_ymd_and_hms(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| start + Duration::days(31 * delta as i64))
}

/// Totals over the records a filter selects
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageAggregate {
    /// Summed cost in USD
    pub total_cost: f64,
    pub request_count: u64,
    /// Requests per quota type
    pub by_quota_type: HashMap<QuotaType, u64>,
    /// Requests answered with a reused value
    pub cache_hits: u64,
}

impl UsageAggregate {
    /// Fold one record into the totals
    pub fn add(&mut self, record: &UsageRecord) {
        self.total_cost += record.cost;
        self.request_count += 1;
        *self.by_quota_type.entry(record.quota_type).or_default() += 1;
        if record.served_from_cache {
            self.cache_hits += 1;
        }
    }

    /// Requests counted against one quota type
    pub fn count_for(&self, quota_type: QuotaType) -> u64 {
        self.by_quota_type.get(&quota_type).copied().unwrap_or(0)
    }
}

impl<'a> FromIterator<&'a UsageRecord> for UsageAggregate {
    fn from_iter<I: IntoIterator<Item = &'a UsageRecord>>(iter: I) -> Self {
        let mut aggregate = Self::default();
        for record in iter {
            aggregate.add(record);
        }
        aggregate
    }
}
