//! Reliability Module
//!
//! Circuit breaking for stores backed by something that can fail, such as a
//! remote cache. The in-memory engine never needs it on its own.

mod breaker;
mod resilient;

pub use breaker::{Breaker, BreakerState, CircuitBreaker};
pub use resilient::ResilientStore;
