//! Configuration Module
//!
//! Construction parameters for the in-memory engine, the circuit breaker and
//! the HTTP front-end. Values can be loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Eviction Policy ==
/// Selects which entry is evicted when a capacity limit is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least recently used entry goes first
    #[default]
    Lru,
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unsupported eviction policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}

// == Memory Store Config ==
/// Configuration for the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Maximum number of items, 0 = unlimited
    pub max_items: usize,
    /// Maximum total estimated bytes, 0 = unlimited
    pub max_bytes: u64,
    /// Eviction policy applied when a limit is reached
    pub eviction_policy: EvictionPolicy,
    /// How often the expiry sweep runs
    pub cleanup_interval: Duration,
    /// Whether hit/miss/set counters are collected
    pub enable_metrics: bool,
}

impl MemoryConfig {
    /// Loads the store configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ITEMS` - Maximum items (default: 0, unlimited)
    /// - `CACHE_MAX_BYTES` - Maximum estimated bytes (default: 0, unlimited)
    /// - `CACHE_EVICTION_POLICY` - Eviction policy name (default: lru)
    /// - `CACHE_CLEANUP_INTERVAL` - Expiry sweep interval in seconds (default: 60)
    /// - `CACHE_ENABLE_METRICS` - Collect statistics (default: false)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let eviction_policy = match env::var("CACHE_EVICTION_POLICY") {
            Ok(name) => name.parse()?,
            Err(_) => defaults.eviction_policy,
        };

        Ok(Self {
            max_items: parse_env("CACHE_MAX_ITEMS").unwrap_or(defaults.max_items),
            max_bytes: parse_env("CACHE_MAX_BYTES").unwrap_or(defaults.max_bytes),
            eviction_policy,
            cleanup_interval: parse_env("CACHE_CLEANUP_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            enable_metrics: parse_env("CACHE_ENABLE_METRICS").unwrap_or(defaults.enable_metrics),
        })
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    pub fn with_max_bytes(mut self, max: u64) -> Self {
        self.max_bytes = max;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Rejects parameters the store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_items: 0,
            max_bytes: 0,
            eviction_policy: EvictionPolicy::Lru,
            cleanup_interval: Duration::from_secs(60),
            enable_metrics: false,
        }
    }
}

// == Circuit Breaker Config ==
/// Thresholds for the circuit breaker wrapping a store.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker
    pub failure_threshold: u32,
    /// How long the breaker stays open before probing again
    pub reset_timeout: Duration,
}

impl BreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(CacheError::InvalidConfiguration(
                "failure threshold must be at least 1".to_string(),
            ));
        }
        if self.reset_timeout.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "reset timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for writes that carry none, 0 = never expires
    pub default_ttl: u64,
    /// Settings for the store served over HTTP
    pub store: MemoryConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - everything read by [`MemoryConfig::from_env`]; metrics default to on
    pub fn from_env() -> Result<Self> {
        let mut store = MemoryConfig::from_env()?;
        if env::var("CACHE_ENABLE_METRICS").is_err() {
            store.enable_metrics = true;
        }
        store.validate()?;

        Ok(Self {
            server_port: parse_env("SERVER_PORT").unwrap_or(3000),
            default_ttl: parse_env("DEFAULT_TTL").unwrap_or(300),
            store,
        })
    }

    /// Default TTL as a duration, `None` when writes never expire by default.
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl > 0).then(|| Duration::from_secs(self.default_ttl))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 300,
            store: MemoryConfig::default().with_metrics(true),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
