use std::sync::Arc;
use tokio::sync::RwLock;

/// Bearer token shared by every request of a service instance.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the token; blank tokens clear it.
    pub async fn set(&self, token: Option<String>) {
        let mut current = self.token.write().await;
        *current = token.filter(|t| !t.trim().is_empty());
    }

    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn clear(&self) {
        self.set(None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_clear() {
        let store = TokenStore::new();
        assert!(store.get().await.is_none());

        store.set(Some("abc".to_string())).await;
        assert_eq!(store.get().await.as_deref(), Some("abc"));

        store.set(Some("  ".to_string())).await;
        assert!(store.get().await.is_none());

        store.set(Some("abc".to_string())).await;
        store.clear().await;
        assert!(store.get().await.is_none());
    }
}
