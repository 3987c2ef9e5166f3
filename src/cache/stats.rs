//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, writes and
//! evictions, plus running item and byte totals.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time copy of the store counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of writes, inserts and replacements alike
    pub sets: u64,
    /// Number of explicit removals
    pub deletes: u64,
    /// Number of entries evicted to satisfy a capacity limit
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in the cache
    pub item_count: u64,
    /// Current estimated size of all entries
    pub bytes_used: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
}

// == Metrics Recorder ==
/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub struct Metrics {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    item_count: AtomicU64,
    bytes_used: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A fresh insert of `bytes`.
    pub fn record_set(&self, bytes: u64) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.item_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_used.fetch_add(bytes, Ordering::Relaxed);
    }

    /// A replacement: item count is unchanged, bytes move by the delta.
    pub fn record_update(&self, old_bytes: u64, new_bytes: u64) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if new_bytes >= old_bytes {
            self.bytes_used
                .fetch_add(new_bytes - old_bytes, Ordering::Relaxed);
        } else {
            saturating_sub(&self.bytes_used, old_bytes - new_bytes);
        }
    }

    pub fn record_delete(&self, bytes: u64) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.release(bytes);
    }

    pub fn record_eviction(&self, bytes: u64) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.release(bytes);
    }

    pub fn record_expiration(&self, bytes: u64) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
        self.release(bytes);
    }

    /// Everything was removed at once. Operation counters are kept.
    pub fn record_flush(&self) {
        self.item_count.store(0, Ordering::Relaxed);
        self.bytes_used.store(0, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        CacheStats {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            item_count: self.item_count.load(Ordering::Relaxed),
            bytes_used: self.bytes_used.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.sets,
            &self.deletes,
            &self.evictions,
            &self.expirations,
            &self.item_count,
            &self.bytes_used,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Sets the item and byte gauges, used after a reset of a non-empty store.
    pub fn restore_gauges(&self, item_count: u64, bytes_used: u64) {
        self.item_count.store(item_count, Ordering::Relaxed);
        self.bytes_used.store(bytes_used, Ordering::Relaxed);
    }

    fn release(&self, bytes: u64) {
        saturating_sub(&self.item_count, 1);
        saturating_sub(&self.bytes_used, bytes);
    }
}

fn saturating_sub(counter: &AtomicU64, n: u64) {
    // The closure never returns None, so the update cannot fail.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_sub(n))
    });
}
