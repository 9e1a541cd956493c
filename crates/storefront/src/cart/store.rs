//! The cart store.
//!
//! # Lifecycle
//!
//! A store starts [`CartPhase::Uninitialized`]. [`CartStore::load`] moves it
//! to [`CartPhase::Loading`] while the single read is in flight and to
//! [`CartPhase::Ready`] once the persisted cart has been hydrated.
//!
//! Nothing is written before `Ready`. Mutations issued earlier are applied in
//! memory right away and queued; when the load completes they are replayed
//! over the hydrated cart and one write covers them all.
//!
//! # Writes
//!
//! Every mutation after `Ready` spawns a background write of the complete
//! item list (or a delete when the cart became empty). Writes pass through a
//! gate that remembers the newest generation written, so a write that lost
//! the race to a newer one is skipped instead of overwriting it.

use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use pideai_core::{
    CartAction, CartEffect, CartEvent, CartItemId, CartLineItem, CartState, ModifierId,
    NewLineItem, Price, ProductId, Selection, resolve, validate,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::{CartDeps, CartError, CartSnapshot};
use crate::report::{ErrorReport, ErrorReporter, ReportLevel, tags};
use crate::storage::{self, CartStorage, StorageError, StorageKey};

/// Where a store is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPhase {
    Uninitialized,
    Loading,
    Ready,
}

/// A single customer's cart.
///
/// Cloning is cheap and every clone refers to the same cart. Mutations
/// complete synchronously and return immediately; persistence happens in
/// spawned tasks, so they must be called from inside a Tokio runtime.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

struct Inner {
    deps: CartDeps,
    state: Mutex<StoreState>,
    snapshots: watch::Sender<Arc<CartSnapshot>>,
    writer: Arc<Writer>,
    writes: Mutex<Vec<JoinHandle<()>>>,
}

struct StoreState {
    phase: CartPhase,
    cart: CartState,
    queued: Vec<CartAction>,
}

/// Everything a background write needs, shared with the spawned tasks.
struct Writer {
    key: StorageKey,
    storage: Arc<dyn CartStorage>,
    reporter: Arc<dyn ErrorReporter>,
    generation: AtomicU64,
    /// Newest generation that has been written.
    written: tokio::sync::Mutex<u64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CartStore {
    /// Create an uninitialized store for the cart persisted under `key`.
    #[must_use]
    pub fn new(deps: CartDeps, key: StorageKey) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(CartSnapshot::default()));
        let writer = Arc::new(Writer {
            key,
            storage: Arc::clone(&deps.storage),
            reporter: Arc::clone(&deps.reporter),
            generation: AtomicU64::new(0),
            written: tokio::sync::Mutex::new(0),
        });

        Self {
            inner: Arc::new(Inner {
                deps,
                state: Mutex::new(StoreState {
                    phase: CartPhase::Uninitialized,
                    cart: CartState::new(),
                    queued: Vec::new(),
                }),
                snapshots,
                writer,
                writes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Storage key this store reads and writes.
    #[must_use]
    pub fn key(&self) -> &StorageKey {
        &self.inner.writer.key
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> CartPhase {
        lock(&self.inner.state).phase
    }

    /// Read the persisted cart and become ready.
    ///
    /// Only the first call does anything. A failed or corrupt read is
    /// reported and the cart starts empty; the stored value is left alone
    /// until the next write replaces it.
    #[instrument(skip(self), fields(key = %self.key()))]
    pub async fn load(&self) {
        {
            let mut state = lock(&self.inner.state);
            if state.phase != CartPhase::Uninitialized {
                return;
            }
            state.phase = CartPhase::Loading;
        }

        let writer = &self.inner.writer;
        let persisted = match storage::load_items(writer.storage.as_ref(), &writer.key).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                let corrupt = matches!(e, StorageError::Corrupt { .. });
                warn!(error = %e, corrupt, "Failed to load persisted cart, starting empty");
                writer.reporter.report(
                    ErrorReport::error(tags::CART_LOAD, e.to_string())
                        .with_extra("key", writer.key.as_str())
                        .with_extra("corrupt", corrupt),
                );
                Vec::new()
            }
        };

        let pending = {
            let mut state = lock(&self.inner.state);
            let mut cart = CartState::hydrated(persisted);
            let queued = std::mem::take(&mut state.queued);
            let replayed = queued.len();

            let mut last_write = None;
            for action in queued {
                last_write = cart
                    .apply(action)
                    .into_iter()
                    .filter(CartEffect::is_persistence)
                    .last()
                    .or(last_write);
            }

            state.cart = cart;
            state.phase = CartPhase::Ready;
            self.publish(&state.cart);
            debug!(items = state.cart.items().len(), replayed, "Cart ready");
            last_write.map(|effect| (self.inner.writer.next_generation(), effect))
        };

        if let Some((generation, effect)) = pending {
            self.spawn_write(generation, effect);
        }
    }

    /// Add one unit of a configuration and return its line identity.
    ///
    /// An identical configuration already in the cart gets its quantity
    /// bumped; its price snapshot and modifiers are left as they were.
    pub fn add_item(&self, item: NewLineItem) -> CartItemId {
        let id = item.cart_item_id();
        self.dispatch(CartAction::Add {
            item,
            at: Utc::now(),
        });
        id
    }

    /// Remove a line. Returns whether anything was removed.
    ///
    /// While the cart is loading the answer only covers changes made so far;
    /// the removal is replayed over the persisted cart once it is read.
    pub fn remove_item(&self, cart_item_id: &CartItemId) -> bool {
        self.dispatch(CartAction::Remove {
            cart_item_id: cart_item_id.clone(),
        })
    }

    /// Set a line's quantity, removing it when `quantity <= 0`.
    ///
    /// Returns whether the cart changed. As with [`Self::remove_item`], a
    /// change made while loading is replayed after hydration.
    pub fn update_quantity(&self, cart_item_id: &CartItemId, quantity: i64) -> bool {
        self.dispatch(CartAction::SetQuantity {
            cart_item_id: cart_item_id.clone(),
            quantity,
        })
    }

    /// Empty the cart and delete its persisted copy.
    pub fn clear_cart(&self) {
        self.dispatch(CartAction::Clear);
    }

    /// Validate a customer's choices against the catalog and add the result.
    ///
    /// This is the confirm step: an invalid selection is rejected with the
    /// per-group errors and nothing is added.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product,
    /// `CartError::SelectionRejected` when a group constraint is violated,
    /// `CartError::UnknownGroup`/`UnknownModifier` for ids the product does
    /// not offer, or `CartError::Catalog` if the lookup fails.
    #[instrument(skip(self, selection, ungrouped_ids), fields(key = %self.key()))]
    pub async fn add_configured_item(
        &self,
        product_id: &ProductId,
        selection: &Selection,
        ungrouped_ids: &BTreeSet<ModifierId>,
    ) -> Result<CartItemId, CartError> {
        let schema = self
            .inner
            .deps
            .catalog
            .product_schema(product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))?;

        if let Some((group_id, _)) = selection
            .iter()
            .find(|(group_id, _)| schema.modifiers.group(group_id).is_none())
        {
            return Err(CartError::UnknownGroup(group_id.clone()));
        }

        let result = validate(selection, &schema.modifiers.groups);
        if !result.is_valid {
            return Err(CartError::SelectionRejected(result.errors));
        }

        if let Some(unknown) = ungrouped_ids
            .iter()
            .find(|id| schema.modifiers.ungrouped_available(id).is_none())
        {
            return Err(CartError::UnknownModifier(unknown.clone()));
        }

        let modifiers = resolve(selection, ungrouped_ids, &schema.modifiers);
        Ok(self.add_item(NewLineItem {
            product_id: schema.product.id,
            name: schema.product.name,
            image_ref: schema.product.image_ref,
            base_price: schema.product.base_price,
            modifiers,
        }))
    }

    /// Copy of the current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        lock(&self.inner.state).cart.items().to_vec()
    }

    /// Copy of one line item.
    #[must_use]
    pub fn item(&self, cart_item_id: &CartItemId) -> Option<CartLineItem> {
        lock(&self.inner.state).cart.get(cart_item_id).cloned()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        lock(&self.inner.state).cart.total_items()
    }

    /// Total price of the cart.
    #[must_use]
    pub fn total_price(&self) -> Price {
        lock(&self.inner.state).cart.total_price()
    }

    /// Current items and aggregates.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from(&lock(&self.inner.state).cart)
    }

    /// Receive a new snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartSnapshot>> {
        self.inner.snapshots.subscribe()
    }

    /// Wait for every write spawned so far to finish.
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *lock(&self.inner.writes));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(key = %self.key(), error = %e, "Cart write task failed");
            }
        }
    }

    /// Apply an action, then run its effects outside the lock.
    ///
    /// Before the cart is ready every action is queued for replay, including
    /// ones that do nothing to the not yet hydrated cart. Write generations
    /// are taken under the state lock so they follow commit order.
    ///
    /// Returns whether the action changed the in-memory cart.
    fn dispatch(&self, action: CartAction) -> bool {
        let (events, writes) = {
            let mut state = lock(&self.inner.state);
            let ready = state.phase == CartPhase::Ready;
            if !ready {
                state.queued.push(action.clone());
            }
            let effects = state.cart.apply(action);
            if effects.is_empty() {
                return false;
            }
            self.publish(&state.cart);

            let mut events = Vec::new();
            let mut writes = Vec::new();
            for effect in effects {
                match effect {
                    CartEffect::Track(event) => events.push(event),
                    effect if ready => writes.push((self.inner.writer.next_generation(), effect)),
                    _ => {}
                }
            }
            (events, writes)
        };

        for (generation, effect) in writes {
            self.spawn_write(generation, effect);
        }
        for event in &events {
            self.track(event);
        }
        true
    }

    fn publish(&self, cart: &CartState) {
        self.inner
            .snapshots
            .send_replace(Arc::new(CartSnapshot::from(cart)));
    }

    /// Deliver an event, reporting but never propagating sink failures.
    fn track(&self, event: &CartEvent) {
        let analytics = &self.inner.deps.analytics;
        let failure = match catch_unwind(AssertUnwindSafe(|| analytics.track(event))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "analytics sink panicked".to_string()),
        };

        warn!(event = event.kind.as_str(), error = %failure, "Analytics delivery failed");
        self.inner.writer.reporter.report(
            ErrorReport::new(tags::CART_ANALYTICS, ReportLevel::Warning, failure)
                .with_extra("key", self.key().as_str())
                .with_extra("event", event.kind.as_str()),
        );
    }

    fn spawn_write(&self, generation: u64, effect: CartEffect) {
        let writer = Arc::clone(&self.inner.writer);
        let handle = tokio::spawn(async move { writer.write(generation, effect).await });

        let mut writes = lock(&self.inner.writes);
        writes.retain(|h| !h.is_finished());
        writes.push(handle);
    }
}

impl Writer {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn write(&self, generation: u64, effect: CartEffect) {
        let mut written = self.written.lock().await;
        if *written > generation {
            debug!(key = %self.key, generation, newest = *written, "Skipping superseded cart write");
            return;
        }

        let (tag, result) = match &effect {
            CartEffect::Persist(items) => (
                tags::CART_SAVE,
                storage::save_items(self.storage.as_ref(), &self.key, items).await,
            ),
            CartEffect::DeletePersisted => {
                (tags::CART_DELETE, self.storage.remove(&self.key).await)
            }
            CartEffect::Track(_) => return,
        };
        *written = generation;

        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "Cart write failed, keeping in-memory cart");
            self.reporter.report(
                ErrorReport::error(tag, e.to_string())
                    .with_extra("key", self.key.as_str())
                    .with_extra("generation", generation),
            );
        }
    }
}
