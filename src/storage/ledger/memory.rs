//! In-memory usage ledger

use super::UsageLedger;
use super::types::{UsageAggregate, UsageFilter, UsageRecord, shift_months, start_of_month};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Whole calendar months kept before the newest record's month
const DEFAULT_RETENTION_MONTHS: u32 = 1;

#[derive(Debug, Default)]
struct Records {
    entries: Vec<UsageRecord>,
    /// Cutoff of the last prune
    pruned_before: Option<DateTime<Utc>>,
}

/// Ledger held in process memory
///
/// Suitable for tests and single-process deployments; records are lost on
/// restart. Appends drop records older than the retained months, so the
/// ledger never holds much more than the budget period it answers for.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<Records>>,
    retention_months: u32,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            retention_months: DEFAULT_RETENTION_MONTHS,
        }
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `months` whole months before the current one
    pub fn with_retention_months(mut self, months: u32) -> Self {
        self.retention_months = months;
        self
    }

    /// Number of records held
    pub async fn len(&self) -> usize {
        self.records.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.entries.is_empty()
    }

    /// Copy of every record, oldest first
    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.read().await.entries.clone()
    }

    /// Drop records older than `cutoff`
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        Self::prune(&mut records, cutoff)
    }

    fn prune(records: &mut Records, cutoff: DateTime<Utc>) -> usize {
        let before = records.entries.len();
        records.entries.retain(|record| record.timestamp >= cutoff);
        records.pruned_before = Some(cutoff);
        let removed = before - records.entries.len();
        if removed > 0 {
            debug!("Pruned {} usage records older than {}", removed, cutoff);
        }
        removed
    }

    fn retention_cutoff(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        shift_months(start_of_month(at), -(self.retention_months as i32))
    }
}

#[async_trait]
impl UsageLedger for InMemoryLedger {
    async fn append(&self, record: &UsageRecord) -> Result<()> {
        let cutoff = self.retention_cutoff(record.timestamp);
        let mut records = self.records.write().await;
        // Only sweep when a newer month moves the cutoff forward
        if records.pruned_before.is_none_or(|previous| cutoff > previous) {
            Self::prune(&mut records, cutoff);
        }
        records.entries.push(record.clone());
        Ok(())
    }

    async fn aggregate(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        let records = self.records.read().await;
        Ok(records.entries.iter().filter(|r| filter.matches(r)).collect())
    }
}
