//! Usage ledger
//!
//! The append-only sink every governed request is recorded to. Budget and
//! quota reads are aggregations over the same records.

mod bounded;
mod memory;
mod types;

pub use bounded::{BoundedLedger, LedgerStats};
pub use memory::InMemoryLedger;
pub use types::{UsageAggregate, UsageFilter, UsageRecord, UsageStatus, start_of_day, start_of_month};

use crate::utils::error::Result;
use async_trait::async_trait;

/// Persisted usage sink
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Append one record
    async fn append(&self, record: &UsageRecord) -> Result<()>;

    /// Totals over the records selected by `filter`
    async fn aggregate(&self, filter: &UsageFilter) -> Result<UsageAggregate>;
}
