//! Persisted cart commands.
//!
//! Reads the same storage backend the storefront is configured with, so the
//! `PIDEAI_STORAGE`, `PIDEAI_CART_DIR` and `PIDEAI_DATABASE_URL` variables
//! apply here too.

use std::sync::Arc;

use pideai_core::{CartState, CartToken, IdError, StoreId};
use pideai_storefront::cart::CartSnapshot;
use pideai_storefront::config::{ConfigError, StorageConfig};
use pideai_storefront::storage::{self, CartStorage, StorageError, StorageKey};
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] IdError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

async fn open(store: &str, token: &str) -> Result<(Arc<dyn CartStorage>, StorageKey), CartCommandError> {
    let key = StorageKey::for_cart(&StoreId::new(store)?, &CartToken::new(token)?);
    let config = StorageConfig::from_env()?;
    tracing::debug!(?config, %key, "Opening cart storage");
    let storage = storage::open(&config).await?;
    Ok((storage, key))
}

/// Print a persisted cart with its totals.
///
/// # Errors
///
/// Returns `CartCommandError` if the ids are invalid, storage cannot be
/// reached, or the stored payload is corrupt.
pub async fn show(store: &str, token: &str) -> Result<(), CartCommandError> {
    let (storage, key) = open(store, token).await?;

    let Some(items) = storage::load_items(storage.as_ref(), &key).await? else {
        tracing::info!("No cart stored under {key}");
        return Ok(());
    };

    let state = CartState::hydrated(items);
    let output = serde_json::to_string_pretty(&CartSnapshot::from(&state))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

/// Delete a persisted cart.
///
/// # Errors
///
/// Returns `CartCommandError` if the ids are invalid or storage cannot be
/// reached.
pub async fn clear(store: &str, token: &str) -> Result<(), CartCommandError> {
    let (storage, key) = open(store, token).await?;
    storage.remove(&key).await?;
    tracing::info!("Removed cart {key}");
    Ok(())
}
