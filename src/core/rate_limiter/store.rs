//! Window store abstraction
//!
//! Both the distributed counter store and the in-process fallback implement
//! [`WindowStore`]; the limiter never depends on a concrete backend.

use super::types::{StoreBackend, WindowAdmission};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Per-key sliding-window counter storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Evict events older than `now - window`, count the rest, and record a
    /// new event at `now` if the count is below `limit`.
    async fn admit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowAdmission>;

    /// Count events in the window without recording anything
    async fn peek(&self, key: &str, window: Duration, now: DateTime<Utc>)
    -> Result<WindowAdmission>;

    /// Drop every event recorded for a key
    async fn reset(&self, key: &str) -> Result<()>;

    /// Which kind of backend this is
    fn backend(&self) -> StoreBackend;
}
