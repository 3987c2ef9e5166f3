//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. Statistics are
//! served as [`crate::cache::CacheStats`] directly.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: JsonValue,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: JsonValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Tags the key now carries
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, tags: Vec<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            tags,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /incr
#[derive(Debug, Clone, Serialize)]
pub struct IncrResponse {
    pub key: String,
    /// Counter value after the increment
    pub value: i64,
}

/// Response body for POST /flush and POST /tags/flush
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
    /// Keys removed by a tag flush
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}

impl FlushResponse {
    pub fn all() -> Self {
        Self {
            message: "Cache flushed".to_string(),
            removed: None,
        }
    }

    pub fn tags(tags: &[String], removed: usize) -> Self {
        Self {
            message: format!("Flushed tags [{}]", tags.join(", ")),
            removed: Some(removed),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", JsonValue::from("test_value"));
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"key":"test_key","value":"test_value"}"#);
    }

    #[test]
    fn test_set_response_omits_empty_tags() {
        let json = serde_json::to_string(&SetResponse::new("my_key", Vec::new())).unwrap();
        assert!(json.contains("successfully"));
        assert!(!json.contains("tags"));

        let json =
            serde_json::to_string(&SetResponse::new("my_key", vec!["users".to_string()])).unwrap();
        assert!(json.contains(r#""tags":["users"]"#));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_flush_response_serialize() {
        let json = serde_json::to_string(&FlushResponse::all()).unwrap();
        assert!(!json.contains("removed"));

        let resp = FlushResponse::tags(&["a".to_string(), "b".to_string()], 3);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""removed":3"#));
        assert!(json.contains("a, b"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(chrono::DateTime::parse_from_rfc3339(&resp.timestamp).is_ok());
    }
}
