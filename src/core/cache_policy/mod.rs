//! Cache TTL policy
//!
//! Base lifetimes per data category, volatility adjustment, and market
//! session classification used for freshness decisions.

mod policy;
mod session;
mod types;


pub use policy::CacheTtlPolicy;
pub use session::MarketHours;
pub use types::{DataCategory, MarketSession, TtlContext, Volatility};
