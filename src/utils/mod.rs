//! Utility modules
//!
//! - **error**: the engine's error type and classification helpers
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;

pub use error::{ErrorCategory, GovernanceError, Result};
pub use logging::init_tracing;
