//! Tagged Cache Module
//!
//! A view over a [`MemoryStore`] bound to a set of tags. Writes through the
//! view replace the key's tag set with the bound tags; flushing the view
//! removes every key carrying any of them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{MemoryStore, Value};
use crate::contract::{Store, TaggedStore};
use crate::error::Result;

// == Tagged Cache ==
#[derive(Debug, Clone)]
pub struct TaggedCache {
    store: MemoryStore,
    tags: Vec<String>,
}

impl TaggedCache {
    pub(crate) fn new(store: MemoryStore, tags: Vec<String>) -> Self {
        Self { store, tags }
    }

    /// Tags bound to this view.
    pub fn bound_tags(&self) -> &[String] {
        &self.tags
    }

    /// Removes every key carrying any of `tags`, or of the bound tags when
    /// `tags` is empty. Returns how many keys were removed.
    pub async fn flush_tag_set(&self, tags: &[String]) -> usize {
        let tags = if tags.is_empty() { &self.tags[..] } else { tags };
        self.store.flush_tag_set(tags).await
    }
}

#[async_trait]
impl Store for TaggedCache {
    async fn get(&self, key: &str) -> Result<Value> {
        self.store.get(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        self.store.get_multi(keys).await
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let full = self.store.prefixed(key);
        self.store
            .inner
            .write()
            .await
            .put_tagged(full, value, ttl, &self.tags);
        Ok(())
    }

    async fn put_multi(&self, items: Vec<(String, Value)>, ttl: Option<Duration>) -> Result<()> {
        let mut store = self.store.inner.write().await;
        for (key, value) in items {
            store.put_tagged(self.store.prefixed(&key), value, ttl, &self.tags);
        }
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.store.increment(key, delta).await
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.store.forget(key).await
    }

    async fn forget_multi(&self, keys: &[String]) -> Result<()> {
        self.store.forget_multi(keys).await
    }

    /// Flushes the bound tags, not the whole store.
    async fn flush(&self) -> Result<()> {
        self.flush_tag_set(&[]).await;
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.store.has(key).await
    }

    fn get_prefix(&self) -> String {
        self.store.get_prefix()
    }

    fn set_prefix(&self, prefix: &str) {
        self.store.set_prefix(prefix)
    }
}

#[async_trait]
impl TaggedStore for TaggedCache {
    type Tagged = TaggedCache;

    /// Tags accumulate: the new view carries the bound tags plus `tags`.
    fn tags(&self, tags: &[&str]) -> TaggedCache {
        let mut all = self.tags.clone();
        all.extend(tags.iter().map(|t| t.to_string()));
        TaggedCache::new(self.store.clone(), all)
    }

    async fn flush_tags(&self, tags: &[&str]) -> Result<()> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.flush_tag_set(&tags).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::contract::Observable;

    fn store() -> MemoryStore {
        MemoryStore::new(MemoryConfig::default().with_metrics(true)).unwrap()
    }

    #[tokio::test]
    async fn test_tagged_put_and_flush() {
        let store = store();

        store
            .tags(&["users", "admins"])
            .put("user:1", Value::from("john"), None)
            .await
            .unwrap();
        store
            .tags(&["posts"])
            .put("post:1", Value::from("hello"), None)
            .await
            .unwrap();

        assert_eq!(store.get("user:1").await.unwrap(), Value::from("john"));

        store.tags(&["users"]).flush().await.unwrap();
        assert!(!store.has("user:1").await.unwrap());
        assert!(store.has("post:1").await.unwrap());

        store.tags(&["posts"]).flush().await.unwrap();
        assert!(!store.has("post:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_flush_scope_with_shared_tags() {
        let store = store();

        store.tags(&["t1"]).put("k1", Value::from("1"), None).await.unwrap();
        store.tags(&["t2"]).put("k2", Value::from("2"), None).await.unwrap();
        store
            .tags(&["t1", "t2"])
            .put("k3", Value::from("3"), None)
            .await
            .unwrap();

        store.flush_tags(&["t1"]).await.unwrap();

        assert!(!store.has("k1").await.unwrap());
        assert!(store.has("k2").await.unwrap());
        assert!(!store.has("k3").await.unwrap());
        assert_eq!(store.stats().await.deletes, 2);
    }

    #[tokio::test]
    async fn test_tags_accumulate() {
        let store = store();
        let view = store.tags(&["a"]).tags(&["b"]);
        assert_eq!(view.bound_tags(), &["a".to_string(), "b".to_string()]);

        view.put("k", Value::from("v"), None).await.unwrap();
        assert_eq!(store.tags_of("k").await, vec!["a".to_string(), "b".to_string()]);

        store.tags(&["b"]).flush().await.unwrap();
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_retagging_replaces_tags() {
        let store = store();

        store.tags(&["old"]).put("k", Value::from("1"), None).await.unwrap();
        store.tags(&["new"]).put("k", Value::from("2"), None).await.unwrap();

        store.flush_tags(&["old"]).await.unwrap();
        assert!(store.has("k").await.unwrap());

        store.flush_tags(&["new"]).await.unwrap();
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_flush_tags_defaults_to_bound_tags() {
        let store = store();
        let view = store.tags(&["scope"]);

        view.put_multi(
            vec![
                ("a".to_string(), Value::from(1i64)),
                ("b".to_string(), Value::from(2i64)),
            ],
            None,
        )
        .await
        .unwrap();
        store.put("c", Value::from(3i64), None).await.unwrap();

        assert_eq!(view.flush_tag_set(&[]).await, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_forget_cleans_tags() {
        let store = store();

        store.tags(&["tag1"]).forever("key1", Value::from("val1")).await.unwrap();
        assert_eq!(store.tags_of("key1").await, vec!["tag1".to_string()]);

        store.forget("key1").await.unwrap();
        assert!(store.tags_of("key1").await.is_empty());
        assert_eq!(store.inner.read().await.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_tagged_keys_are_prefixed() {
        let store = store();
        store.set_prefix("app");

        store.tags(&["t"]).put("k", Value::from("v"), None).await.unwrap();
        assert_eq!(store.tags_of("k").await, vec!["t".to_string()]);

        store.flush_tags(&["t"]).await.unwrap();
        assert!(!store.has("k").await.unwrap());
    }
}
