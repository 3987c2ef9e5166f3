//! Cache Item Module
//!
//! Defines the structure for individual cache items with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::Value;

// == Cache Item ==
/// Represents a single cache item with value and expiry.
#[derive(Debug, Clone)]
pub struct CacheItem {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheItem {
    // == Constructor ==
    /// Creates a new cache item with optional TTL.
    ///
    /// A TTL of `None` or zero means the item never expires. TTLs too large
    /// to represent in milliseconds clamp to the far future.
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| {
            let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            current_timestamp_ms().saturating_add(ttl_ms)
        });

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// Boundary condition: an item is expired once the current time is greater
    /// than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against a caller-supplied clock reading, used by sweeps
    /// so every item is judged against the same instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
