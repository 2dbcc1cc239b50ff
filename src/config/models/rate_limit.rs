//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the scope used when a request's scope has no entry of its own
pub const DEFAULT_SCOPE: &str = "default";

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allow the request when neither backend can answer
    #[serde(default = "default_true")]
    pub fail_open: bool,
    /// Timeout for one distributed-store call in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Sweep interval for the in-process fallback store
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Per-scope limits, e.g. `auth`, `search`, `default`
    #[serde(default = "default_scopes")]
    pub scopes: HashMap<String, ScopeLimit>,
}

/// Limit and window for one endpoint class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeLimit {
    /// Maximum admitted events per window
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl ScopeLimit {
    pub fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }
}

impl Default for ScopeLimit {
    fn default() -> Self {
        Self::new(default_limit(), default_window_seconds())
    }
}

fn default_scopes() -> HashMap<String, ScopeLimit> {
    HashMap::from([
        (DEFAULT_SCOPE.to_string(), ScopeLimit::default()),
        ("auth".to_string(), ScopeLimit::new(5, 300)),
        ("search".to_string(), ScopeLimit::new(30, 60)),
        ("analysis".to_string(), ScopeLimit::new(10, 60)),
    ])
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_open: true,
            store_timeout_ms: default_store_timeout_ms(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            scopes: default_scopes(),
        }
    }
}

impl RateLimitConfig {
    /// Limit for a scope, falling back to the `default` entry
    pub fn scope(&self, scope: &str) -> ScopeLimit {
        self.scopes
            .get(scope)
            .or_else(|| self.scopes.get(DEFAULT_SCOPE))
            .copied()
            .unwrap_or_default()
    }

    /// Merge rate limit configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.enabled = other.enabled;
        self.fail_open = other.fail_open;
        if other.store_timeout_ms != default_store_timeout_ms() {
            self.store_timeout_ms = other.store_timeout_ms;
        }
        if other.cleanup_interval_secs != default_cleanup_interval_secs() {
            self.cleanup_interval_secs = other.cleanup_interval_secs;
        }
        self.scopes.extend(other.scopes);
        self
    }
}
