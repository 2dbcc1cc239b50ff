//! Rate limiter types and data structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which backend answered an admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Shared store visible to every process instance
    Distributed,
    /// In-process fallback
    Local,
    /// No backend answered, or limiting is disabled
    Unenforced,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Distributed => write!(f, "distributed"),
            StoreBackend::Local => write!(f, "local"),
            StoreBackend::Unenforced => write!(f, "unenforced"),
        }
    }
}

/// What a window store reports for one admit or peek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAdmission {
    /// Whether the event was recorded
    pub allowed: bool,
    /// Events in the window before this call
    pub current_count: u32,
    /// Oldest event still inside the window
    pub oldest: Option<DateTime<Utc>>,
}

/// Rate limit result
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Events in the window before this request
    pub current_count: u32,
    /// Maximum requests allowed
    pub limit: u32,
    /// Remaining requests in the window
    pub remaining: u32,
    /// When the caller can assume a fresh window
    pub reset_at: DateTime<Utc>,
    /// Retry after (in seconds, only set when not allowed)
    pub retry_after_secs: Option<u64>,
    /// Backend that made the decision
    pub backend: StoreBackend,
}

impl RateLimitResult {
    /// Build the caller-facing result from a store answer
    pub(crate) fn from_admission(
        admission: WindowAdmission,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
        backend: StoreBackend,
    ) -> Self {
        let window_delta = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());

        let retry_after_secs = if admission.allowed {
            None
        } else {
            // Time until the oldest event leaves the window
            let secs = match admission.oldest {
                Some(oldest) => (oldest + window_delta - now).num_seconds(),
                None => window.as_secs() as i64,
            };
            Some(secs.max(1) as u64)
        };

        Self {
            allowed: admission.allowed,
            current_count: admission.current_count,
            limit,
            remaining: if admission.allowed {
                limit.saturating_sub(admission.current_count).saturating_sub(1)
            } else {
                0
            },
            reset_at: now + window_delta,
            retry_after_secs,
            backend,
        }
    }

    /// Result used when limiting is disabled or every backend failed open
    pub(crate) fn unenforced(limit: u32, window: Duration, now: DateTime<Utc>) -> Self {
        let window_delta = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        Self {
            allowed: true,
            current_count: 0,
            limit,
            remaining: limit,
            reset_at: now + window_delta,
            retry_after_secs: None,
            backend: StoreBackend::Unenforced,
        }
    }

    /// Result used when every backend failed and the deployment is fail-closed
    pub(crate) fn closed(limit: u32, window: Duration, now: DateTime<Utc>) -> Self {
        let window_delta = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        Self {
            allowed: false,
            current_count: limit,
            limit,
            remaining: 0,
            reset_at: now + window_delta,
            retry_after_secs: Some(window.as_secs().max(1)),
            backend: StoreBackend::Unenforced,
        }
    }
}

/// Counters exposed for monitoring store health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    /// Requests admitted
    pub admitted: u64,
    /// Requests denied
    pub denied: u64,
    /// Distributed-store calls that fell back to the local store
    pub fallbacks: u64,
    /// Decisions where no backend could answer
    pub unenforced: u64,
}
