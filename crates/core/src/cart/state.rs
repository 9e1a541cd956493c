//! Pure cart transitions.
//!
//! [`CartState::apply`] is a deterministic function of the current items and
//! one [`CartAction`]. It never performs I/O; instead it returns the
//! [`CartEffect`]s the runtime should carry out once the new state is
//! committed. This keeps every cart rule testable without a runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::identity::cart_item_id;
use crate::cart::{CartEvent, CartEventKind, CartLineItem, NewLineItem};
use crate::types::{CartItemId, Price};

/// A requested cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    /// Add one unit of a configuration, merging into an existing line.
    Add { item: NewLineItem, at: DateTime<Utc> },
    /// Delete a line if present.
    Remove { cart_item_id: CartItemId },
    /// Set a line's quantity; zero or below deletes it.
    SetQuantity {
        cart_item_id: CartItemId,
        quantity: i64,
    },
    /// Empty the cart.
    Clear,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEffect {
    /// Write the complete item list.
    Persist(Vec<CartLineItem>),
    /// Delete the persisted cart; empty carts are not stored.
    DeletePersisted,
    /// Emit an analytics event.
    Track(CartEvent),
}

impl CartEffect {
    /// Whether this effect touches persistence.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persist(_) | Self::DeletePersisted)
    }
}

/// The cart's line items in insertion order, unique by `cart_item_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<CartLineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted items.
    ///
    /// Identities are re-derived from product and modifiers, duplicate
    /// identities are merged into the first occurrence by summing their
    /// quantities, and zero-quantity lines are dropped.
    #[must_use]
    pub fn hydrated(persisted: Vec<CartLineItem>) -> Self {
        let mut items: Vec<CartLineItem> = Vec::with_capacity(persisted.len());
        for mut item in persisted {
            if item.quantity == 0 {
                continue;
            }
            item.cart_item_id = cart_item_id(&item.product_id, &item.modifiers);
            match items.iter_mut().find(|i| i.cart_item_id == item.cart_item_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => items.push(item),
            }
        }
        Self { items }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line by identity.
    #[must_use]
    pub fn get(&self, id: &CartItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.cart_item_id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of `(unit base price + modifier prices) * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Apply one action and return the effects to run after committing.
    ///
    /// Actions on absent lines are no-ops and return no effects.
    pub fn apply(&mut self, action: CartAction) -> Vec<CartEffect> {
        match action {
            CartAction::Add { item, at } => self.add(item, at),
            CartAction::Remove { cart_item_id } => self.remove(&cart_item_id),
            CartAction::SetQuantity {
                cart_item_id,
                quantity,
            } => self.set_quantity(&cart_item_id, quantity),
            CartAction::Clear => {
                self.items.clear();
                vec![
                    CartEffect::DeletePersisted,
                    CartEffect::Track(CartEvent::cleared()),
                ]
            }
        }
    }

    fn add(&mut self, item: NewLineItem, at: DateTime<Utc>) -> Vec<CartEffect> {
        let id = item.cart_item_id();
        let index = match self.items.iter().position(|i| i.cart_item_id == id) {
            Some(index) => {
                if let Some(existing) = self.items.get_mut(index) {
                    existing.quantity = existing.quantity.saturating_add(1);
                }
                index
            }
            None => {
                self.items.push(CartLineItem::new(item, at));
                self.items.len() - 1
            }
        };

        let event = self.items.get(index).map(|line| {
            CartEvent::for_line(
                CartEventKind::ItemAdded,
                line,
                line.quantity,
                self.total_price(),
                self.total_items(),
            )
        });
        self.effects_with(event)
    }

    fn remove(&mut self, id: &CartItemId) -> Vec<CartEffect> {
        let Some(index) = self.items.iter().position(|i| &i.cart_item_id == id) else {
            return Vec::new();
        };
        let removed = self.items.remove(index);
        let event = CartEvent::for_line(
            CartEventKind::ItemRemoved,
            &removed,
            0,
            self.total_price(),
            self.total_items(),
        );
        self.effects_with(Some(event))
    }

    fn set_quantity(&mut self, id: &CartItemId, quantity: i64) -> Vec<CartEffect> {
        if quantity <= 0 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(line) = self.items.iter_mut().find(|i| &i.cart_item_id == id) else {
            return Vec::new();
        };
        line.quantity = quantity;

        let event = self.get(id).map(|line| {
            CartEvent::for_line(
                CartEventKind::QuantityUpdated,
                line,
                line.quantity,
                self.total_price(),
                self.total_items(),
            )
        });
        self.effects_with(event)
    }

    fn persistence_effect(&self) -> CartEffect {
        if self.items.is_empty() {
            CartEffect::DeletePersisted
        } else {
            CartEffect::Persist(self.items.clone())
        }
    }

    fn effects_with(&self, event: Option<CartEvent>) -> Vec<CartEffect> {
        let mut effects = vec![self.persistence_effect()];
        effects.extend(event.map(CartEffect::Track));
        effects
    }
}
