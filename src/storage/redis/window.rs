//! Sliding-window store on Redis sorted sets

use super::pool::RedisPool;
use crate::core::rate_limiter::{StoreBackend, WindowAdmission, WindowStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::Script;
use std::time::Duration;

/// Trim, count, conditionally add and expire in one round trip
///
/// Denied attempts are not recorded, and admissions for one key are
/// serialized by Redis.
const ADMIT_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now, ARGV[4])
    allowed = 1
end
redis.call('PEXPIRE', key, window)

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest_ms = -1
if oldest[2] then
    oldest_ms = tonumber(oldest[2])
end
return {allowed, count, oldest_ms}
"#;

/// Window store shared by every process pointing at the same Redis
pub struct RedisWindowStore {
    pool: RedisPool,
    script: Script,
}

impl RedisWindowStore {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            script: Script::new(ADMIT_SCRIPT),
        }
    }
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms < 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn admit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowAdmission> {
        let mut conn = self.pool.connection()?;
        let now_ms = now.timestamp_millis();
        let member = format!("{}-{}", now_ms, uuid::Uuid::new_v4());

        let (allowed, count, oldest_ms): (i64, i64, i64) = self
            .script
            .key(self.pool.key(key))
            .arg(now_ms)
            .arg(window_millis(window))
            .arg(limit)
            .arg(member)
            .invoke_async(&mut conn)
            .await?;

        Ok(WindowAdmission {
            allowed: allowed == 1,
            current_count: u32::try_from(count).unwrap_or(u32::MAX),
            oldest: from_millis(oldest_ms),
        })
    }

    async fn peek(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowAdmission> {
        let mut conn = self.pool.connection()?;
        let key = self.pool.key(key);
        let window_start = format!("({}", now.timestamp_millis() - window_millis(window));

        let (count, oldest): (u32, Vec<(String, f64)>) = redis::pipe()
            .zcount(&key, &window_start, "+inf")
            .zrangebyscore_limit_withscores(&key, &window_start, "+inf", 0, 1)
            .query_async(&mut conn)
            .await?;

        Ok(WindowAdmission {
            allowed: true,
            current_count: count,
            oldest: oldest.first().and_then(|(_, score)| from_millis(*score as i64)),
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.connection()?;
        let _: () = redis::cmd("DEL")
            .arg(self.pool.key(key))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Distributed
    }
}
