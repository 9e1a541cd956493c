//! `PostgreSQL` cart storage.
//!
//! These tests require a reachable database:
//! - `PIDEAI_DATABASE_URL` (or `DATABASE_URL`) pointing at a scratch database
//!
//! Run with: `cargo test -p pideai-integration-tests -- --include-ignored`

#![allow(clippy::unwrap_used)]

use pideai_storefront::storage::{CartStorage, MIGRATOR, PgStorage, StorageKey, create_pool};
use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;

async fn storage() -> PgStorage {
    let url = std::env::var("PIDEAI_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("PIDEAI_DATABASE_URL or DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url)).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    PgStorage::new(pool)
}

fn unique_key() -> StorageKey {
    StorageKey::new(format!("it-store:cart:{}", Uuid::new_v4()))
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_save_load_replace_remove() {
    let storage = storage().await;
    let key = unique_key();

    assert!(storage.load(&key).await.unwrap().is_none());

    storage.save(&key, json!([{ "n": 1 }])).await.unwrap();
    assert_eq!(storage.load(&key).await.unwrap(), Some(json!([{ "n": 1 }])));

    storage.save(&key, json!([])).await.unwrap();
    assert_eq!(storage.load(&key).await.unwrap(), Some(json!([])));

    storage.remove(&key).await.unwrap();
    assert!(storage.load(&key).await.unwrap().is_none());

    // Removing again is not an error
    storage.remove(&key).await.unwrap();
}
