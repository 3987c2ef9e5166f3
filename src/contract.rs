//! Store Contract
//!
//! The uniform interface exposed by the in-memory engine, by the resilient
//! wrapper, and by any remote-backed store plugged in behind them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheStats, Value};
use crate::error::Result;

// == Store ==
/// Key-value operations every store supports.
///
/// A TTL of `None` or zero means the item never expires.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the value under `key`, or `NotFound` if absent or expired.
    async fn get(&self, key: &str) -> Result<Value>;

    /// Returns the values that were found. Missing keys are left out.
    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Value>>;

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Writes the items in order, each with the same TTL.
    async fn put_multi(&self, items: Vec<(String, Value)>, ttl: Option<Duration>) -> Result<()>;

    /// Adds `delta` to an integer value, treating missing or non-numeric
    /// values as zero. Returns the new value.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    async fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        self.increment(key, delta.saturating_neg()).await
    }

    /// Stores a value that never expires.
    async fn forever(&self, key: &str, value: Value) -> Result<()> {
        self.put(key, value, None).await
    }

    /// Removes a key. Removing an absent key succeeds.
    async fn forget(&self, key: &str) -> Result<()>;

    async fn forget_multi(&self, keys: &[String]) -> Result<()>;

    /// Removes everything this store is responsible for.
    async fn flush(&self) -> Result<()>;

    async fn has(&self, key: &str) -> Result<bool>;

    async fn is_missing(&self, key: &str) -> Result<bool> {
        Ok(!self.has(key).await?)
    }

    /// Key namespace applied to every operation.
    fn get_prefix(&self) -> String;

    fn set_prefix(&self, prefix: &str);
}

// == Tagged Store ==
/// Stores that can group keys under tags for bulk invalidation.
#[async_trait]
pub trait TaggedStore: Store {
    /// The tag-scoped view returned by [`TaggedStore::tags`].
    type Tagged: TaggedStore;

    /// Returns a view whose writes associate keys with `tags`.
    fn tags(&self, tags: &[&str]) -> Self::Tagged;

    /// Removes every key carrying any of `tags`.
    async fn flush_tags(&self, tags: &[&str]) -> Result<()>;
}

// == Observable ==
/// Stores that expose hit/miss/eviction statistics.
#[async_trait]
pub trait Observable: Send + Sync {
    async fn stats(&self) -> CacheStats;
}
