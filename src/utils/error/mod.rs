//! Error handling utilities
//!
//! This module provides the engine's error type and its classification helpers.

pub mod error;

// Re-export commonly used types
pub use error::*;
