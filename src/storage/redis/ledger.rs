//! Usage ledger on Redis
//!
//! Each append pushes the JSON record onto one list per UTC day and, in the
//! same transaction, bumps counter hashes: spend totals per day and per month,
//! and per-caller (or per-address, for anonymous requests) counts per day.
//! Budget and quota aggregates are answered from the hashes; the lists are
//! kept for audit and for filters the counters do not cover.

use super::pool::RedisPool;
use crate::config::models::default_ledger_timeout_ms;
use crate::core::quota::QuotaType;
use crate::storage::ledger::{UsageAggregate, UsageFilter, UsageLedger, UsageRecord};
use crate::utils::error::{GovernanceError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::time::timeout;
use tracing::warn;

/// Days a daily key is kept; must cover the longest budget period
const DEFAULT_RETENTION_DAYS: i64 = 40;

const FIELD_COST: &str = "cost";
const FIELD_COUNT: &str = "count";
const FIELD_CACHE_HITS: &str = "cache_hits";
const QUOTA_FIELD_PREFIX: &str = "quota:";

/// Ledger shared by every process pointing at the same Redis
pub struct RedisLedger {
    pool: RedisPool,
    retention: Duration,
    op_timeout: std::time::Duration,
}

impl RedisLedger {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            op_timeout: std::time::Duration::from_millis(default_ledger_timeout_ms()),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_timeout(mut self, op_timeout: std::time::Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    fn day_key(&self, day: NaiveDate) -> String {
        self.pool.key(&format!("usage:{}", day.format("%Y-%m-%d")))
    }

    fn totals_day_key(&self, day: NaiveDate) -> String {
        self.pool
            .key(&format!("usage:totals:day:{}", day.format("%Y-%m-%d")))
    }

    fn totals_month_key(&self, at: DateTime<Utc>) -> String {
        self.pool
            .key(&format!("usage:totals:month:{}", at.format("%Y-%m")))
    }

    fn caller_day_key(&self, day: NaiveDate, caller_id: &str) -> String {
        self.pool
            .key(&format!("usage:caller:day:{}:{}", day.format("%Y-%m-%d"), caller_id))
    }

    fn address_day_key(&self, day: NaiveDate, client_addr: &str) -> String {
        self.pool
            .key(&format!("usage:addr:day:{}:{}", day.format("%Y-%m-%d"), client_addr))
    }

    fn days_of(filter: &UsageFilter) -> impl Iterator<Item = NaiveDate> {
        let first = filter.since.date_naive();
        let last = (filter.until - Duration::milliseconds(1)).date_naive();
        first.iter_days().take_while(move |day| *day <= last)
    }

    /// Daily list keys covering `[since, until)`
    pub(super) fn keys_for(&self, filter: &UsageFilter) -> Vec<String> {
        Self::days_of(filter).map(|day| self.day_key(day)).collect()
    }

    /// Counter hashes that answer `filter`, or `None` when only a list scan can
    pub(super) fn counter_keys_for(&self, filter: &UsageFilter) -> Option<Vec<String>> {
        if filter.provider.is_some() || !filter.is_day_aligned() {
            return None;
        }

        match (&filter.caller_id, &filter.client_addr) {
            (None, None) if filter.is_calendar_month() => {
                Some(vec![self.totals_month_key(filter.since)])
            }
            (None, None) => Some(
                Self::days_of(filter)
                    .map(|day| self.totals_day_key(day))
                    .collect(),
            ),
            (Some(caller_id), None) => Some(
                Self::days_of(filter)
                    .map(|day| self.caller_day_key(day, caller_id))
                    .collect(),
            ),
            (None, Some(client_addr)) => Some(
                Self::days_of(filter)
                    .map(|day| self.address_day_key(day, client_addr))
                    .collect(),
            ),
            (Some(_), Some(_)) => None,
        }
    }

    /// Counter hashes one record contributes to
    fn counter_keys(&self, record: &UsageRecord) -> Vec<String> {
        let day = record.timestamp.date_naive();
        let mut keys = vec![
            self.totals_day_key(day),
            self.totals_month_key(record.timestamp),
        ];
        match (&record.caller_id, &record.client_addr) {
            (Some(caller_id), _) => keys.push(self.caller_day_key(day, caller_id)),
            (None, Some(client_addr)) => keys.push(self.address_day_key(day, client_addr)),
            (None, None) => {}
        }
        keys
    }

    async fn read_counters(&self, keys: &[String]) -> Result<UsageAggregate> {
        let mut conn = self.pool.connection()?;
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut aggregate = UsageAggregate::default();
        for fields in &hashes {
            fold_counters(&mut aggregate, fields);
        }
        Ok(aggregate)
    }

    async fn scan_lists(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        let mut conn = self.pool.connection()?;
        let mut pipe = redis::pipe();
        for key in self.keys_for(filter) {
            pipe.lrange(key, 0, -1);
        }
        let days: Vec<Vec<String>> = pipe.query_async(&mut conn).await?;

        let mut aggregate = UsageAggregate::default();
        for payload in days.iter().flatten() {
            match serde_json::from_str::<UsageRecord>(payload) {
                Ok(record) if filter.matches(&record) => aggregate.add(&record),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable usage record: {}", e),
            }
        }
        Ok(aggregate)
    }
}

fn quota_field(quota_type: QuotaType) -> String {
    format!("{}{}", QUOTA_FIELD_PREFIX, quota_type)
}

/// Add one counter hash to the running totals
pub(super) fn fold_counters(aggregate: &mut UsageAggregate, fields: &HashMap<String, String>) {
    for (field, value) in fields {
        if field == FIELD_COST {
            match value.parse::<f64>() {
                Ok(cost) => aggregate.total_cost += cost,
                Err(e) => warn!("Skipping unreadable spend counter '{}': {}", value, e),
            }
            continue;
        }

        let Ok(count) = value.parse::<u64>() else {
            warn!("Skipping unreadable usage counter {}='{}'", field, value);
            continue;
        };
        match field.as_str() {
            FIELD_COUNT => aggregate.request_count += count,
            FIELD_CACHE_HITS => aggregate.cache_hits += count,
            other => match other
                .strip_prefix(QUOTA_FIELD_PREFIX)
                .map(str::parse::<QuotaType>)
            {
                Some(Ok(quota_type)) => {
                    *aggregate.by_quota_type.entry(quota_type).or_default() += count
                }
                _ => warn!("Ignoring unknown usage counter {}", other),
            },
        }
    }
}

#[async_trait]
impl UsageLedger for RedisLedger {
    async fn append(&self, record: &UsageRecord) -> Result<()> {
        let mut conn = self.pool.connection()?;
        let list = self.day_key(record.timestamp.date_naive());
        let payload = serde_json::to_string(record)?;
        let retention_secs = self.retention.num_seconds();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .rpush(&list, payload)
            .ignore()
            .expire(&list, retention_secs)
            .ignore();
        for key in self.counter_keys(record) {
            pipe.hincr(&key, FIELD_COST, record.cost)
                .ignore()
                .hincr(&key, FIELD_COUNT, 1u64)
                .ignore()
                .hincr(&key, quota_field(record.quota_type), 1u64)
                .ignore();
            if record.served_from_cache {
                pipe.hincr(&key, FIELD_CACHE_HITS, 1u64).ignore();
            }
            pipe.expire(&key, retention_secs).ignore();
        }

        let write = async {
            let _: () = pipe.query_async(&mut conn).await?;
            Ok::<(), GovernanceError>(())
        };
        timeout(self.op_timeout, write)
            .await
            .map_err(|_| GovernanceError::timeout(format!("Ledger append to {} timed out", list)))?
    }

    async fn aggregate(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        if filter.until <= filter.since {
            return Ok(UsageAggregate::default());
        }

        let read = async {
            match self.counter_keys_for(filter) {
                Some(keys) => self.read_counters(&keys).await,
                None => self.scan_lists(filter).await,
            }
        };
        timeout(self.op_timeout, read)
            .await
            .map_err(|_| GovernanceError::timeout("Ledger aggregate timed out"))?
    }
}
