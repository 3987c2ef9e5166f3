//! Resilient Store
//!
//! Wraps any [`Store`] with a [`Breaker`]. Each call asks the breaker first,
//! fails fast with [`CacheError::CircuitOpen`] when it refuses, and reports
//! the outcome afterwards. A missing key is a normal answer and counts as a
//! success.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{CacheStats, Value};
use crate::config::BreakerConfig;
use crate::contract::{Observable, Store, TaggedStore};
use crate::error::{CacheError, Result};
use crate::reliability::{Breaker, CircuitBreaker};

// == Resilient Store ==
#[derive(Debug)]
pub struct ResilientStore<S, B = CircuitBreaker> {
    inner: S,
    breaker: Arc<B>,
}

impl<S: Clone, B> Clone for ResilientStore<S, B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            breaker: Arc::clone(&self.breaker),
        }
    }
}

impl<S> ResilientStore<S, CircuitBreaker> {
    /// Wraps `inner` with a threshold breaker built from `config`.
    pub fn with_config(inner: S, config: BreakerConfig) -> Result<Self> {
        Ok(Self::new(inner, CircuitBreaker::new(config)?))
    }
}

impl<S, B> ResilientStore<S, B> {
    pub fn new(inner: S, breaker: B) -> Self {
        Self::with_shared(inner, Arc::new(breaker))
    }

    /// Wraps `inner` with a breaker shared with other wrappers.
    pub fn with_shared(inner: S, breaker: Arc<B>) -> Self {
        Self { inner, breaker }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn breaker(&self) -> &B {
        &self.breaker
    }
}

impl<S, B: Breaker> ResilientStore<S, B> {
    async fn guard<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.breaker.allow() {
            debug!("circuit open, rejecting call");
            return Err(CacheError::CircuitOpen);
        }

        let result = call.await;
        match &result {
            Ok(_) => self.breaker.report_success(),
            Err(err) if err.is_not_found() => self.breaker.report_success(),
            Err(_) => self.breaker.report_failure(),
        }
        result
    }
}

#[async_trait]
impl<S: Store, B: Breaker> Store for ResilientStore<S, B> {
    async fn get(&self, key: &str) -> Result<Value> {
        self.guard(self.inner.get(key)).await
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        self.guard(self.inner.get_multi(keys)).await
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        self.guard(self.inner.put(key, value, ttl)).await
    }

    async fn put_multi(&self, items: Vec<(String, Value)>, ttl: Option<Duration>) -> Result<()> {
        self.guard(self.inner.put_multi(items, ttl)).await
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.guard(self.inner.increment(key, delta)).await
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.guard(self.inner.forget(key)).await
    }

    async fn forget_multi(&self, keys: &[String]) -> Result<()> {
        self.guard(self.inner.forget_multi(keys)).await
    }

    async fn flush(&self) -> Result<()> {
        self.guard(self.inner.flush()).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.guard(self.inner.has(key)).await
    }

    fn get_prefix(&self) -> String {
        self.inner.get_prefix()
    }

    fn set_prefix(&self, prefix: &str) {
        self.inner.set_prefix(prefix)
    }
}

#[async_trait]
impl<S: TaggedStore, B: Breaker> TaggedStore for ResilientStore<S, B> {
    type Tagged = ResilientStore<S::Tagged, B>;

    fn tags(&self, tags: &[&str]) -> Self::Tagged {
        ResilientStore::with_shared(self.inner.tags(tags), Arc::clone(&self.breaker))
    }

    async fn flush_tags(&self, tags: &[&str]) -> Result<()> {
        self.guard(self.inner.flush_tags(tags)).await
    }
}

#[async_trait]
impl<S: Observable, B: Breaker> Observable for ResilientStore<S, B> {
    async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}
