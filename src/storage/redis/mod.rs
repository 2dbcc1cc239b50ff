//! Redis storage implementation
//!
//! Distributed backends for the governance engine.
//!
//! ## Module Structure
//!
//! - `pool` - Connection management and no-op mode
//! - `window` - Sliding-window rate limit store (sorted sets + Lua)
//! - `ledger` - Usage ledger (one list per UTC day)
//! - `tests` - Module tests

mod ledger;
mod pool;
mod window;

// Re-export public types
pub use ledger::RedisLedger;
pub use pool::RedisPool;
pub use window::RedisWindowStore;
