use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::ApiResult;

/// Memoized GET results, keyed by endpoint name and payload.
///
/// Unbounded and never expires; entries live as long as the owning service.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, ApiResult>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// `"<endpoint>:<payload JSON>"`. Object keys serialize sorted, so
    /// JSON-identical payloads share a key.
    pub fn key(endpoint: &str, payload: &Value) -> String {
        format!("{}:{}", endpoint, serde_json::to_string(payload).unwrap_or_default())
    }

    pub async fn get(&self, key: &str) -> Option<ApiResult> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    pub async fn set(&self, key: String, result: ApiResult) {
        let mut entries = self.entries.write().await;
        entries.insert(key, result);
    }

    pub async fn remove(&self, key: &str) -> Option<ApiResult> {
        let mut entries = self.entries.write().await;
        entries.remove(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ignores_member_order() {
        let a = json!({ "id": 1, "name": "x" });
        let b: Value = serde_json::from_str(r#"{"name":"x","id":1}"#).unwrap();
        assert_eq!(ResponseCache::key("getUser", &a), ResponseCache::key("getUser", &b));
        assert_eq!(ResponseCache::key("getUser", &json!({})), "getUser:{}");
        assert_ne!(ResponseCache::key("getUser", &a), ResponseCache::key("listUsers", &a));
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let cache = ResponseCache::new();
        assert!(cache.is_empty().await);

        cache.set("k".to_string(), ApiResult::ok(json!({ "a": 1 }), 200)).await;
        assert_eq!(cache.get("k").await.unwrap().status, Some(200));
        assert_eq!(cache.len().await, 1);

        // Clones share storage
        let shared = cache.clone();
        shared.clear().await;
        assert!(cache.get("k").await.is_none());
    }
}
