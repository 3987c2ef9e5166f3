//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU ordering, the tag
//! index and TTL expiration.
//!
//! Every method here assumes the caller already holds the store lock
//! (`&mut self` or `&self` through the guard), so compound operations such as
//! "evict, insert, then tag" run inside one critical section.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheItem, CacheStats, LruList, Metrics, NodeHandle, TagIndex, Value};
use crate::config::MemoryConfig;
use crate::error::{CacheError, Result};

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Deleted,
    Evicted,
    Expired,
}

/// An item together with its LRU handle and charged size.
#[derive(Debug)]
struct Slot {
    item: CacheItem,
    node: NodeHandle,
    size: u64,
}

// == Cache Store ==
/// In-memory cache state with LRU eviction, tags and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, Slot>,
    /// Recency order for eviction
    lru: LruList,
    /// Tag <-> key associations
    tags: TagIndex,
    /// Performance statistics, `None` when disabled
    metrics: Option<Metrics>,
    /// Estimated bytes of all entries, tracked even without metrics
    bytes_used: u64,
    /// Maximum number of entries, 0 = unlimited
    max_items: usize,
    /// Maximum estimated bytes, 0 = unlimited
    max_bytes: u64,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruList::new(),
            tags: TagIndex::new(),
            metrics: config.enable_metrics.then(Metrics::new),
            bytes_used: 0,
            max_items: config.max_items,
            max_bytes: config.max_bytes,
        }
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used.
    ///
    /// Expired entries are removed on the spot and counted as misses.
    pub fn get(&mut self, key: &str) -> Result<Value> {
        let found = self
            .entries
            .get(key)
            .map(|slot| (slot.item.is_expired(), slot.node));

        match found {
            Some((false, node)) => {
                self.lru.touch(node);
                self.record(Metrics::record_hit);
                let value = self
                    .entries
                    .get(key)
                    .map(|slot| slot.item.value.clone())
                    .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
                Ok(value)
            }
            Some((true, _)) => {
                debug!(key, "discarding expired entry on read");
                self.remove(key, Removal::Expired);
                self.record(Metrics::record_miss);
                Err(CacheError::NotFound(key.to_string()))
            }
            None => {
                self.record(Metrics::record_miss);
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Contains ==
    /// Existence probe honoring expiry. Does not change recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slot| !slot.item.is_expired())
    }

    // == Put ==
    /// Stores a value, replacing any existing item under `key`.
    ///
    /// Tag associations of a live item are left untouched. An expired item
    /// is removed first, so the write counts as a fresh insert.
    pub fn put(&mut self, key: String, value: Value, ttl: Option<Duration>) {
        // A dead item must not pass its tags or slot on to the new one
        if self.entries.get(&key).is_some_and(|slot| slot.item.is_expired()) {
            self.remove(&key, Removal::Expired);
        }

        let size = value.estimated_size();
        let existing = self.entries.get(&key).map(|slot| (slot.size, slot.node));

        if let Some((_, node)) = existing {
            self.lru.touch(node);
        }

        let delta = size as i128 - existing.map_or(0, |(old, _)| old) as i128;
        if delta > 0 || (existing.is_none() && self.max_items > 0) {
            self.make_room(&key, existing.is_none(), delta.max(0) as u64);
        }

        let item = CacheItem::new(value, ttl);
        match self.entries.get_mut(&key) {
            Some(slot) => {
                let old_size = slot.size;
                slot.item = item;
                slot.size = size;
                self.bytes_used = self.bytes_used.saturating_sub(old_size) + size;
                if let Some(metrics) = &self.metrics {
                    metrics.record_update(old_size, size);
                }
            }
            None => {
                let node = self.lru.insert_front(key.clone());
                self.entries.insert(key, Slot { item, node, size });
                self.bytes_used += size;
                if let Some(metrics) = &self.metrics {
                    metrics.record_set(size);
                }
            }
        }

        if self.max_bytes > 0 && self.bytes_used > self.max_bytes {
            warn!(
                bytes_used = self.bytes_used,
                max_bytes = self.max_bytes,
                "byte budget exceeded: eviction could not free enough space"
            );
        }
    }

    // == Put Tagged ==
    /// Stores a value and replaces its tag set with `tags`.
    pub fn put_tagged(&mut self, key: String, value: Value, ttl: Option<Duration>, tags: &[String]) {
        self.put(key.clone(), value, ttl);
        if self.entries.contains_key(&key) {
            self.tags.associate(&key, tags);
        }
    }

    // == Increment ==
    /// Adds `delta` to the integer stored under `key`.
    ///
    /// Missing, expired or non-numeric values count as zero. The result is
    /// stored without expiry and saturates at the `i64` bounds.
    pub fn increment(&mut self, key: &str, delta: i64) -> i64 {
        let current = self
            .entries
            .get(key)
            .filter(|slot| !slot.item.is_expired())
            .and_then(|slot| slot.item.value.as_i64())
            .unwrap_or(0);

        let updated = current.saturating_add(delta);
        self.put(key.to_string(), Value::Int(updated), None);
        updated
    }

    // == Forget ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn forget(&mut self, key: &str) -> bool {
        self.remove(key, Removal::Deleted)
    }

    // == Flush ==
    /// Removes every entry, node and tag association.
    pub fn flush(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.tags.clear();
        self.bytes_used = 0;
        if let Some(metrics) = &self.metrics {
            metrics.record_flush();
        }
    }

    // == Flush Tags ==
    /// Removes every key carrying any of `tags`. Returns the number removed.
    pub fn flush_tags(&mut self, tags: &[String]) -> usize {
        let keys = self.tags.keys_for(tags);
        keys.iter()
            .filter(|key| self.remove(key, Removal::Deleted))
            .count()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired_keys
            .iter()
            .filter(|key| self.remove(key, Removal::Expired))
            .count()
    }

    // == Stats ==
    /// Returns current statistics, all zero when metrics are disabled.
    pub fn stats(&self) -> CacheStats {
        self.metrics
            .as_ref()
            .map(Metrics::snapshot)
            .unwrap_or_default()
    }

    /// Zeroes the statistics counters. The item and byte gauges keep
    /// describing the current contents.
    pub fn reset_stats(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.reset();
            metrics.restore_gauges(self.entries.len() as u64, self.bytes_used);
        }
    }

    pub fn tags_for(&self, key: &str) -> Option<&[String]> {
        self.tags.tags_for(key)
    }

    /// Estimated bytes held by all entries.
    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Capacity Policy ==
    /// Evicts least recently used entries until the pending write fits.
    ///
    /// The key being written is never evicted; it was touched to the front
    /// beforehand, so it only reaches the tail once it is the sole entry.
    fn make_room(&mut self, key: &str, is_new: bool, delta: u64) {
        loop {
            let over_items = is_new && self.max_items > 0 && self.entries.len() >= self.max_items;
            let over_bytes = self.max_bytes > 0 && self.bytes_used + delta > self.max_bytes;
            if !over_items && !over_bytes {
                return;
            }

            let victim = match self.lru.peek_tail() {
                Some(tail) if tail != key => tail.to_string(),
                _ => return,
            };
            debug!(key = %victim, "evicting least recently used entry");
            self.remove(&victim, Removal::Evicted);
        }
    }

    /// Removes an entry from the map, the LRU list and the tag index.
    fn remove(&mut self, key: &str, reason: Removal) -> bool {
        let Some(slot) = self.entries.remove(key) else {
            return false;
        };

        self.lru.remove(slot.node);
        self.tags.dissociate(key);
        self.bytes_used = self.bytes_used.saturating_sub(slot.size);

        if let Some(metrics) = &self.metrics {
            match reason {
                Removal::Deleted => metrics.record_delete(slot.size),
                Removal::Evicted => metrics.record_eviction(slot.size),
                Removal::Expired => metrics.record_expiration(slot.size),
            }
        }
        true
    }

    fn record(&self, f: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }

    /// Checks that the map, the LRU list and the tag index agree.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        use std::collections::HashSet;

        let map_keys: HashSet<&str> = self.entries.keys().map(String::as_str).collect();
        let lru_keys: HashSet<&str> = self.lru.keys().collect();
        let handles_match = self
            .entries
            .iter()
            .all(|(key, slot)| self.lru.key(slot.node) == Some(key.as_str()));
        let tagged_live = self
            .tags
            .keys_for(&self.all_tags())
            .iter()
            .all(|key| map_keys.contains(key.as_str()));
        let bytes: u64 = self.entries.values().map(|slot| slot.size).sum();

        self.lru.is_consistent()
            && self.tags.is_consistent()
            && self.lru.len() == self.entries.len()
            && map_keys == lru_keys
            && handles_match
            && tagged_live
            && bytes == self.bytes_used
    }

    #[cfg(test)]
    fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .entries
            .keys()
            .filter_map(|key| self.tags.tags_for(key))
            .flatten()
            .cloned()
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    #[cfg(test)]
    pub(crate) fn tag_count(&self) -> usize {
        self.tags.tag_count()
    }
}
