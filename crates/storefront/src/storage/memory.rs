//! In-process storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{CartStorage, StorageError, StorageKey};

/// Volatile storage backed by a map. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<StorageKey, Value>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &StorageKey, value: Value) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_remove_missing_key_succeeds() {
        let storage = MemoryStorage::new();
        storage.remove(&StorageKey::new("nope")).await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_replaces_value() {
        let storage = MemoryStorage::new();
        let key = StorageKey::new("k");
        storage.save(&key, json!([1])).await.unwrap();
        storage.save(&key, json!([2])).await.unwrap();
        assert_eq!(storage.load(&key).await.unwrap(), Some(json!([2])));
        assert_eq!(storage.len().await, 1);
    }
}
