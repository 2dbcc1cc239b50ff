//! Stable string keys for counters and cached results
//!
//! Every key the engine writes goes through here so the distributed store and
//! the in-process fallback agree on naming.

use std::fmt;

/// Separator between key segments
const SEPARATOR: char = ':';

/// Build a key from an entity and a qualifier, e.g. `("analysis", "AAPL")`
///
/// Segments are trimmed and lowercased; embedded separators are replaced so a
/// qualifier can never spill into another key's namespace.
pub fn build_key(entity: &str, qualifier: &str) -> String {
    format!(
        "{}{}{}",
        normalize(entity),
        SEPARATOR,
        normalize(qualifier)
    )
}

fn normalize(segment: &str) -> String {
    segment
        .trim()
        .chars()
        .map(|c| match c {
            SEPARATOR => '_',
            c if c.is_whitespace() => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    /// Authenticated user id, if any
    pub user_id: Option<String>,
    /// Remote address of the request
    pub remote_addr: String,
}

impl CallerIdentity {
    pub fn user(user_id: impl Into<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            remote_addr: remote_addr.into(),
        }
    }

    pub fn anonymous(remote_addr: impl Into<String>) -> Self {
        Self {
            user_id: None,
            remote_addr: remote_addr.into(),
        }
    }

    /// Identifier used for rate limiting: the user when known, else the address
    pub fn rate_identifier(&self) -> String {
        match &self.user_id {
            Some(id) => build_key("user", id),
            None => build_key("ip", &self.remote_addr),
        }
    }
}

/// Key of one sliding window: `{scope, identifier, window}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub scope: String,
    pub identifier: String,
    pub window_seconds: u64,
}

impl RateKey {
    pub fn new(scope: impl Into<String>, identifier: impl Into<String>, window_seconds: u64) -> Self {
        Self {
            scope: scope.into(),
            identifier: identifier.into(),
            window_seconds,
        }
    }

    /// Storage key for this window
    pub fn storage_key(&self) -> String {
        format!(
            "ratelimit{}{}{}{}{}{}",
            SEPARATOR,
            normalize(&self.scope),
            SEPARATOR,
            self.identifier,
            SEPARATOR,
            self.window_seconds
        )
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
