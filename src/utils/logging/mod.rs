//! Tracing subscriber setup
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the host unless it asks for [`init_tracing`].

use crate::config::LoggingConfig;
use crate::utils::error::{GovernanceError, Result};
use tracing_subscriber::EnvFilter;

/// Build the event filter, letting `RUST_LOG` override the configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        GovernanceError::config(format!("Invalid log level '{}': {}", config.level, e))
    })
}

/// Install a global fmt subscriber
///
/// Fails if the level is unparsable or a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.with_thread_ids(false).try_init()
    };

    installed.map_err(|e| GovernanceError::internal(format!("Failed to install subscriber: {}", e)))
}
