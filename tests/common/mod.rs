//! Common test utilities for meterline
//!
//! - Fixed instants and configuration factories
//! - Stores and ledgers that fail or stall on demand
//! - Custom assertions

pub mod assertions;

pub use fixtures::{EngineFactory, TestEngine};
pub use stores::{FailingWindowStore, FlakyLedger, SlowLedger, SlowWindowStore};

/// Skip test if environment variable is not set
#[macro_export]
macro_rules! skip_without_env {
    ($var:expr) => {
        if std::env::var($var).is_err() {
            eprintln!("Skipping test: {} environment variable not set", $var);
            return;
        }
    };
}
