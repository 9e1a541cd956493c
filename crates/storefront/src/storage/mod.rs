//! Cart persistence.
//!
//! The cart store talks to an opaque async key-value API. Each cart lives
//! under one fixed key and is stored as its complete line-item list.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local map, for tests and development
//! - [`FileStorage`] - one JSON file per key
//! - [`PgStorage`] - `cart_snapshot` table in `PostgreSQL`

mod file;
mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use pideai_core::{CartLineItem, CartToken, StoreId};
use serde_json::Value;
use thiserror::Error;

use crate::config::StorageConfig;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use postgres::{MIGRATOR, PgStorage, create_pool};

/// Errors that can occur when reading or writing persisted carts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored payload could not be decoded.
    #[error("Corrupt payload under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key under which one cart is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key used when a process holds a single cart.
    pub const DEFAULT_CART: &'static str = "cart";

    /// Key for a specific cart of a specific store.
    #[must_use]
    pub fn for_cart(store_id: &StoreId, token: &CartToken) -> Self {
        Self(format!("{store_id}:cart:{token}"))
    }

    /// Use an arbitrary key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CART)
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Async key-value persistence used by the cart store.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Read the value under `key`, `None` if nothing is stored.
    async fn load(&self, key: &StorageKey) -> Result<Option<Value>, StorageError>;

    /// Replace the value under `key`.
    async fn save(&self, key: &StorageKey, value: Value) -> Result<(), StorageError>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError>;
}

/// Load and decode a persisted line-item list.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` if the stored value is not a line-item list,
/// or whatever the backend reports.
pub async fn load_items(
    storage: &dyn CartStorage,
    key: &StorageKey,
) -> Result<Option<Vec<CartLineItem>>, StorageError> {
    let Some(value) = storage.load(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encode and persist a line-item list.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if encoding fails, or whatever the
/// backend reports.
pub async fn save_items(
    storage: &dyn CartStorage,
    key: &StorageKey,
    items: &[CartLineItem],
) -> Result<(), StorageError> {
    let value = serde_json::to_value(items).map_err(StorageError::Serialize)?;
    storage.save(key, value).await
}

/// Open the backend selected by configuration.
///
/// # Errors
///
/// Returns `StorageError::Database` if the `PostgreSQL` pool cannot connect.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn CartStorage>, StorageError> {
    let storage: Arc<dyn CartStorage> = match config {
        StorageConfig::Memory => Arc::new(MemoryStorage::new()),
        StorageConfig::File { dir } => Arc::new(FileStorage::new(dir)),
        StorageConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            Arc::new(PgStorage::new(pool))
        }
    };
    Ok(storage)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use pideai_core::{ChosenModifier, ModifierId, NewLineItem, Price, ProductId};

    use super::*;

    fn line(product: &str, quantity: u32) -> CartLineItem {
        let mut item = CartLineItem::new(
            NewLineItem {
                product_id: ProductId::new(product).unwrap(),
                name: product.to_string(),
                image_ref: Some(format!("img/{product}.jpg")),
                base_price: Price::from_cents(1000).unwrap(),
                modifiers: vec![ChosenModifier {
                    id: ModifierId::new("e1").unwrap(),
                    name: "Cheese".to_string(),
                    price: Price::from_cents(150).unwrap(),
                    group_id: None,
                    group_name: None,
                }],
            },
            Utc::now(),
        );
        item.quantity = quantity;
        item
    }

    #[test]
    fn test_key_for_cart() {
        let key = StorageKey::for_cart(
            &StoreId::new("store-1").unwrap(),
            &CartToken::new("abc").unwrap(),
        );
        assert_eq!(key.as_str(), "store-1:cart:abc");
        assert_eq!(StorageKey::default().as_str(), "cart");
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let storage = MemoryStorage::new();
        let key = StorageKey::default();
        let items = vec![line("p2", 3), line("p1", 1)];

        save_items(&storage, &key, &items).await.unwrap();
        let loaded = load_items(&storage, &key).await.unwrap().unwrap();
        assert_eq!(loaded, items);
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let storage = MemoryStorage::new();
        assert!(load_items(&storage, &StorageKey::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_payload() {
        let storage = MemoryStorage::new();
        let key = StorageKey::default();
        storage
            .save(&key, serde_json::json!({"not": "a list"}))
            .await
            .unwrap();

        let err = load_items(&storage, &key).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
