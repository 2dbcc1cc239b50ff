//! Rate Limiting Implementation
//!
//! Sliding-window admission control with a distributed store and an
//! in-process fallback behind one [`WindowStore`] contract.

mod limiter;
mod local;
mod store;
mod types;
mod utils;


// Re-export public types
pub use limiter::RateLimiter;
pub use local::LocalWindowStore;
pub use store::WindowStore;
pub use types::{LimiterStats, RateLimitResult, StoreBackend, WindowAdmission};

#[cfg(test)]
pub use store::MockWindowStore;
