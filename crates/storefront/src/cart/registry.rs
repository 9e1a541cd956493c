//! Live cart stores, one per cart token.

use std::time::Duration;

use moka::future::Cache;
use pideai_core::{CartToken, StoreId};
use tracing::debug;
use uuid::Uuid;

use super::{CartDeps, CartStore};
use crate::storage::StorageKey;

/// Keeps a loaded [`CartStore`] per cart token of one tenant.
///
/// Stores idle for longer than the configured timeout are evicted; their
/// carts are reloaded from storage on the next request.
#[derive(Clone)]
pub struct CartRegistry {
    store_id: StoreId,
    deps: CartDeps,
    carts: Cache<CartToken, CartStore>,
}

impl CartRegistry {
    #[must_use]
    pub fn new(store_id: StoreId, deps: CartDeps, idle_timeout: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_timeout)
            .build();
        Self {
            store_id,
            deps,
            carts,
        }
    }

    /// Tenant this registry serves.
    #[must_use]
    pub const fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    /// Mint a token for a new, empty cart.
    #[must_use]
    pub fn new_token(&self) -> CartToken {
        CartToken::new(Uuid::new_v4().to_string())
            .unwrap_or_else(|_| unreachable!("a UUID is never blank"))
    }

    /// The ready store for a token, loading it on first use.
    ///
    /// Concurrent callers for the same token share one load.
    pub async fn open(&self, token: &CartToken) -> CartStore {
        self.carts
            .get_with_by_ref(token, async {
                debug!(cart_token = %token, "Opening cart");
                let store = CartStore::new(
                    self.deps.clone(),
                    StorageKey::for_cart(&self.store_id, token),
                );
                store.load().await;
                store
            })
            .await
    }

    /// Wait for pending writes of every live cart.
    pub async fn flush_all(&self) {
        for (_, store) in self.carts.iter() {
            store.flush().await;
        }
    }
}
