//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheStats, MemoryStore, Value};
use crate::config::Config;
use crate::contract::{Observable, Store};
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, FlushResponse, FlushTagsRequest, GetResponse, HealthResponse, IncrRequest,
    IncrResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// The store handle is cheap to clone and does its own locking.
#[derive(Clone)]
pub struct AppState {
    pub cache: MemoryStore,
    /// TTL applied when a SET carries none
    pub default_ttl: Option<Duration>,
}

impl AppState {
    pub fn new(cache: MemoryStore, default_ttl: Option<Duration>) -> Self {
        Self { cache, default_ttl }
    }

    /// Builds the store described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = MemoryStore::new(config.store.clone())?;
        Ok(Self::new(cache, config.default_ttl()))
    }
}

/// Handler for PUT /set
///
/// Stores a value with an optional TTL. When tags are given the key's tag
/// set is replaced with them.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs).or(state.default_ttl);
    let value = Value::from(req.value);

    if req.tags.is_empty() {
        state.cache.put(&req.key, value, ttl).await?;
    } else {
        state
            .cache
            .tagged(req.tags.iter().cloned())
            .put(&req.key, value, ttl)
            .await?;
    }

    Ok(Json(SetResponse::new(req.key, req.tags)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key).await?;
    Ok(Json(GetResponse::new(key, value.to_json())))
}

/// Handler for DELETE /del/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.forget(&key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /incr
pub async fn incr_handler(
    State(state): State<AppState>,
    Json(req): Json<IncrRequest>,
) -> Result<Json<IncrResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let value = state.cache.increment(&req.key, req.delta).await?;
    Ok(Json(IncrResponse {
        key: req.key,
        value,
    }))
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> Result<Json<FlushResponse>> {
    state.cache.flush().await?;
    Ok(Json(FlushResponse::all()))
}

/// Handler for POST /tags/flush
pub async fn flush_tags_handler(
    State(state): State<AppState>,
    Json(req): Json<FlushTagsRequest>,
) -> Result<Json<FlushResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.flush_tag_set(&req.tags).await;
    Ok(Json(FlushResponse::tags(&req.tags, removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use serde_json::json;

    fn test_state() -> AppState {
        let cache = MemoryStore::new(MemoryConfig::default().with_metrics(true)).unwrap();
        AppState::new(cache, Some(Duration::from_secs(300)))
    }

    fn set_request(key: &str, value: serde_json::Value, tags: &[&str]) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value,
            ttl: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = set_request("test_key", json!("test_value"), &[]);
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!("test_value"));
    }

    #[tokio::test]
    async fn test_structured_value_round_trips() {
        let state = test_state();
        let value = json!({"name": "john", "roles": ["admin"]});

        set_handler(State(state.clone()), Json(set_request("user", value.clone(), &[])))
            .await
            .unwrap();

        let response = get_handler(State(state), Path("user".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, value);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let state = test_state();

        let req = set_request("to_delete", json!("value"), &[]);
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        assert!(delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .is_ok());
        assert!(delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .is_ok());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_incr_handler() {
        let state = test_state();

        let req = IncrRequest {
            key: "hits".to_string(),
            delta: 5,
        };
        assert_eq!(incr_handler(State(state.clone()), Json(req)).await.unwrap().value, 5);

        let req = IncrRequest {
            key: "hits".to_string(),
            delta: -2,
        };
        assert_eq!(incr_handler(State(state), Json(req)).await.unwrap().value, 3);
    }

    #[tokio::test]
    async fn test_tagged_set_and_flush_tags() {
        let state = test_state();

        let req = set_request("user:1", json!("john"), &["users"]);
        set_handler(State(state.clone()), Json(req)).await.unwrap();
        let req = set_request("post:1", json!("hi"), &["posts"]);
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let req = FlushTagsRequest {
            tags: vec!["users".to_string()],
        };
        let response = flush_tags_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.removed, Some(1));

        assert!(get_handler(State(state.clone()), Path("user:1".to_string()))
            .await
            .is_err());
        assert!(get_handler(State(state), Path("post:1".to_string()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_flush_handler() {
        let state = test_state();

        let req = set_request("k", json!(1), &[]);
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        flush_handler(State(state.clone())).await.unwrap();
        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let req = set_request("", json!("value"), &[]);
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_flush_tags_requires_tags() {
        let state = test_state();

        let req = FlushTagsRequest { tags: Vec::new() };
        let result = flush_tags_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
