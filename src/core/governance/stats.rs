//! Pipeline counters

use crate::storage::ledger::LedgerStats;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(super) struct FacadeCounters {
    pub(super) admitted: AtomicU64,
    pub(super) rate_limited: AtomicU64,
    pub(super) quota_denied: AtomicU64,
    pub(super) budget_denied: AtomicU64,
    pub(super) served_from_cache: AtomicU64,
    pub(super) served_stale: AtomicU64,
    pub(super) generated: AtomicU64,
}

impl FacadeCounters {
    pub(super) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self, store_fallbacks: u64, ledger: LedgerStats) -> GovernanceStats {
        GovernanceStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            quota_denied: self.quota_denied.load(Ordering::Relaxed),
            budget_denied: self.budget_denied.load(Ordering::Relaxed),
            served_from_cache: self.served_from_cache.load(Ordering::Relaxed),
            served_stale: self.served_stale.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
            store_fallbacks,
            ledger_read_failures: ledger.read_failures,
            ledger_write_failures: ledger.write_failures,
        }
    }
}

/// Snapshot of pipeline outcomes since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GovernanceStats {
    pub admitted: u64,
    pub rate_limited: u64,
    pub quota_denied: u64,
    /// Generation refused by the budget, whether or not a stale value was served
    pub budget_denied: u64,
    /// Completed requests answered from a fresh cached value
    pub served_from_cache: u64,
    /// Completed requests answered from a stale value after a budget denial
    pub served_stale: u64,
    /// Completed requests that ran paid generation
    pub generated: u64,
    /// Distributed-store calls answered by the local fallback
    pub store_fallbacks: u64,
    /// Budget and quota reads that failed or timed out
    pub ledger_read_failures: u64,
    /// Usage records that could not be appended
    pub ledger_write_failures: u64,
}
