//! Tagcache - an in-process cache engine
//!
//! TTL expiration, LRU eviction under item and byte limits, tag-based group
//! invalidation, hit/miss statistics and a circuit-breaking store wrapper,
//! plus a small HTTP front-end.

pub mod api;
pub mod cache;
pub mod config;
pub mod contract;
pub mod error;
pub mod models;
pub mod reliability;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, MemoryStore, TaggedCache, Value};
pub use config::{BreakerConfig, Config, EvictionPolicy, MemoryConfig};
pub use contract::{Observable, Store, TaggedStore};
pub use error::{CacheError, Result};
pub use reliability::{Breaker, BreakerState, CircuitBreaker, ResilientStore};
pub use tasks::{spawn_expiry_task, ExpiryManager};
