//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction, tag-based
//! invalidation and statistics.

mod entry;
mod lru;
mod memory;
mod stats;
mod store;
mod tagged;
mod tags;
mod value;


// Re-export public types
pub use entry::CacheItem;
pub use lru::{LruList, NodeHandle};
pub use memory::MemoryStore;
pub use stats::{CacheStats, Metrics};
pub use store::CacheStore;
pub use tagged::TaggedCache;
pub use tags::TagIndex;
pub use value::Value;
