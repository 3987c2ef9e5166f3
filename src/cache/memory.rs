//! Memory Store Module
//!
//! Thread-safe handle over [`CacheStore`]. Every public operation takes the
//! store lock exactly once and calls the already-locked engine methods.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, TaggedCache, Value};
use crate::config::MemoryConfig;
use crate::contract::{Observable, Store, TaggedStore};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_expiry_task, ExpiryManager};

// == Memory Store ==
/// In-process store with TTL, LRU eviction, tags and metrics.
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub(crate) inner: Arc<RwLock<CacheStore>>,
    prefix: Arc<parking_lot::RwLock<String>>,
    config: Arc<MemoryConfig>,
}

impl MemoryStore {
    // == Constructor ==
    /// Builds a store after validating `config`.
    ///
    /// The expiry sweep is not started here; see [`MemoryStore::start_expiry`].
    pub fn new(config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        info!(
            max_items = config.max_items,
            max_bytes = config.max_bytes,
            policy = %config.eviction_policy,
            metrics = config.enable_metrics,
            "memory store initialized"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(CacheStore::new(&config))),
            prefix: Arc::new(parking_lot::RwLock::new(String::new())),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Starts the periodic expiry sweep at the configured interval.
    pub fn start_expiry(&self) -> ExpiryManager {
        spawn_expiry_task(self.clone(), self.config.cleanup_interval)
    }

    /// Removes every expired item now. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.inner.write().await.remove_expired()
    }

    /// Returns a view whose writes tag keys with `tags`.
    pub fn tagged<I, T>(&self, tags: I) -> TaggedCache
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        TaggedCache::new(self.clone(), tags.into_iter().map(Into::into).collect())
    }

    /// Removes every key carrying any of `tags`. Returns how many were removed.
    pub async fn flush_tag_set(&self, tags: &[String]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        self.inner.write().await.flush_tags(tags)
    }

    /// Tags currently associated with `key`.
    pub async fn tags_of(&self, key: &str) -> Vec<String> {
        let key = self.prefixed(key);
        self.inner
            .read()
            .await
            .tags_for(&key)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    pub async fn reset_stats(&self) {
        self.inner.read().await.reset_stats();
    }

    /// Number of stored items, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn bytes_used(&self) -> u64 {
        self.inner.read().await.bytes_used()
    }

    /// Applies the key namespace: `prefix:key`, or `key` with no prefix.
    pub(crate) fn prefixed(&self, key: &str) -> String {
        let prefix = self.prefix.read();
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", prefix, key)
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Value> {
        let full = self.prefixed(key);
        self.inner
            .write()
            .await
            .get(&full)
            .map_err(|_| CacheError::NotFound(key.to_string()))
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        let mut store = self.inner.write().await;
        let found = keys
            .iter()
            .filter_map(|key| {
                store
                    .get(&self.prefixed(key))
                    .ok()
                    .map(|value| (key.clone(), value))
            })
            .collect();
        Ok(found)
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let full = self.prefixed(key);
        self.inner.write().await.put(full, value, ttl);
        Ok(())
    }

    async fn put_multi(&self, items: Vec<(String, Value)>, ttl: Option<Duration>) -> Result<()> {
        let mut store = self.inner.write().await;
        for (key, value) in items {
            store.put(self.prefixed(&key), value, ttl);
        }
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let full = self.prefixed(key);
        Ok(self.inner.write().await.increment(&full, delta))
    }

    async fn forget(&self, key: &str) -> Result<()> {
        let full = self.prefixed(key);
        self.inner.write().await.forget(&full);
        Ok(())
    }

    async fn forget_multi(&self, keys: &[String]) -> Result<()> {
        let mut store = self.inner.write().await;
        for key in keys {
            store.forget(&self.prefixed(key));
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.inner.write().await.flush();
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let full = self.prefixed(key);
        Ok(self.inner.read().await.contains(&full))
    }

    fn get_prefix(&self) -> String {
        self.prefix.read().clone()
    }

    fn set_prefix(&self, prefix: &str) {
        *self.prefix.write() = prefix.to_string();
    }
}

#[async_trait]
impl TaggedStore for MemoryStore {
    type Tagged = TaggedCache;

    fn tags(&self, tags: &[&str]) -> TaggedCache {
        self.tagged(tags.iter().copied())
    }

    async fn flush_tags(&self, tags: &[&str]) -> Result<()> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.flush_tag_set(&tags).await;
        Ok(())
    }
}

#[async_trait]
impl Observable for MemoryStore {
    async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}
