//! In-process sliding-window store
//!
//! One counter per key in a sharded concurrent map. Each admit holds the
//! key's shard lock for the whole trim-count-record sequence, so admissions
//! for one key are exact within this process.

use super::store::WindowStore;
use super::types::{StoreBackend, WindowAdmission};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Event timestamps for one key
#[derive(Debug, Clone, Default)]
struct WindowCounter {
    /// Event times in epoch milliseconds
    timestamps: Vec<i64>,
    /// Window the key was last admitted with, used by cleanup
    window_ms: i64,
}

impl WindowCounter {
    fn evict(&mut self, window_start: i64) {
        self.timestamps.retain(|&t| t > window_start);
    }

    fn oldest(&self) -> Option<DateTime<Utc>> {
        self.timestamps
            .iter()
            .min()
            .and_then(|&ms| Utc.timestamp_millis_opt(ms).single())
    }

    fn newest(&self) -> Option<i64> {
        self.timestamps.iter().max().copied()
    }
}

/// Sliding-window store local to this process
#[derive(Debug, Default)]
pub struct LocalWindowStore {
    counters: DashMap<String, WindowCounter>,
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

impl LocalWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Remove keys whose newest event has left its window
    pub fn cleanup(&self, now: DateTime<Utc>) -> usize {
        let now_ms = now.timestamp_millis();
        let before = self.counters.len();

        self.counters.retain(|_, counter| {
            counter.evict(now_ms - counter.window_ms);
            counter.newest().is_some()
        });

        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            debug!("Rate limiter cleanup removed {} idle keys", removed);
        }
        removed
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.cleanup(Utc::now());
            }
        })
    }
}

#[async_trait]
impl WindowStore for LocalWindowStore {
    async fn admit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowAdmission> {
        let now_ms = now.timestamp_millis();
        let window_ms = window_millis(window);

        // Avoid String allocation if key already exists
        let mut entry = match self.counters.get_mut(key) {
            Some(entry) => entry,
            None => self.counters.entry(key.to_string()).or_default(),
        };
        let counter = entry.value_mut();

        counter.window_ms = window_ms;
        counter.evict(now_ms - window_ms);

        let current_count = counter.timestamps.len() as u32;
        let allowed = current_count < limit;
        if allowed {
            counter.timestamps.push(now_ms);
        }

        Ok(WindowAdmission {
            allowed,
            current_count,
            oldest: counter.oldest(),
        })
    }

    async fn peek(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowAdmission> {
        let window_start = now.timestamp_millis() - window_millis(window);

        let Some(counter) = self.counters.get(key) else {
            return Ok(WindowAdmission {
                allowed: true,
                current_count: 0,
                oldest: None,
            });
        };

        let live: Vec<i64> = counter
            .timestamps
            .iter()
            .copied()
            .filter(|&t| t > window_start)
            .collect();

        Ok(WindowAdmission {
            allowed: true,
            current_count: live.len() as u32,
            oldest: live
                .iter()
                .min()
                .and_then(|&ms| Utc.timestamp_millis_opt(ms).single()),
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.counters.remove(key);
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }
}
