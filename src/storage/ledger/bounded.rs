//! Time-bounded ledger access
//!
//! Every read and append goes through one short timeout so a stalled sink
//! can never hold a request for long. Failures and timeouts are counted.

use super::UsageLedger;
use super::types::{UsageAggregate, UsageFilter, UsageRecord};
use crate::utils::error::{GovernanceError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

/// Failure counts since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Aggregates that errored or timed out
    pub read_failures: u64,
    /// Appends that errored or timed out
    pub write_failures: u64,
}

/// Wraps a ledger with a per-call timeout and failure counters
pub struct BoundedLedger {
    inner: Arc<dyn UsageLedger>,
    op_timeout: Duration,
    read_failures: AtomicU64,
    write_failures: AtomicU64,
}

impl BoundedLedger {
    pub fn new(inner: Arc<dyn UsageLedger>, op_timeout: Duration) -> Self {
        Self {
            inner,
            op_timeout,
            read_failures: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            read_failures: self.read_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }

    fn bounded<T>(
        &self,
        result: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
        what: &str,
        failures: &AtomicU64,
    ) -> Result<T> {
        let result = match result {
            Ok(inner) => inner,
            Err(_) => Err(GovernanceError::timeout(format!(
                "Ledger {} exceeded {}ms",
                what,
                self.op_timeout.as_millis()
            ))),
        };
        if result.is_err() {
            failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

#[async_trait]
impl UsageLedger for BoundedLedger {
    async fn append(&self, record: &UsageRecord) -> Result<()> {
        let result = timeout(self.op_timeout, self.inner.append(record)).await;
        self.bounded(result, "append", &self.write_failures)
    }

    async fn aggregate(&self, filter: &UsageFilter) -> Result<UsageAggregate> {
        let result = timeout(self.op_timeout, self.inner.aggregate(filter)).await;
        self.bounded(result, "aggregate", &self.read_failures)
    }
}
