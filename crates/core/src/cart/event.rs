//! Analytics event schema for cart operations.

use serde::{Deserialize, Serialize};

use crate::cart::CartLineItem;
use crate::types::{Price, ProductId};

/// What happened to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEventKind {
    ItemAdded,
    ItemRemoved,
    QuantityUpdated,
    CartCleared,
}

impl CartEventKind {
    /// Event name as sent to the analytics backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ItemAdded => "item_added",
            Self::ItemRemoved => "item_removed",
            Self::QuantityUpdated => "quantity_updated",
            Self::CartCleared => "cart_cleared",
        }
    }
}

/// Fixed-schema analytics event emitted after a cart mutation commits.
///
/// Product fields are `None` only for [`CartEventKind::CartCleared`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEvent {
    pub kind: CartEventKind,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_price: Option<Price>,
    pub modifier_count: usize,
    pub modifier_price: Price,
    /// Quantity of the affected line after the mutation, zero if removed.
    pub quantity: u32,
    /// Cart total after the mutation.
    pub cart_value: Price,
    /// Number of units in the cart after the mutation.
    pub item_count: u64,
}

impl CartEvent {
    pub(crate) fn for_line(
        kind: CartEventKind,
        line: &CartLineItem,
        quantity: u32,
        cart_value: Price,
        item_count: u64,
    ) -> Self {
        Self {
            kind,
            product_id: Some(line.product_id.clone()),
            product_name: Some(line.name.clone()),
            product_price: Some(line.unit_base_price),
            modifier_count: line.modifiers.len(),
            modifier_price: line.modifiers_price(),
            quantity,
            cart_value,
            item_count,
        }
    }

    pub(crate) const fn cleared() -> Self {
        Self {
            kind: CartEventKind::CartCleared,
            product_id: None,
            product_name: None,
            product_price: None,
            modifier_count: 0,
            modifier_price: Price::ZERO,
            quantity: 0,
            cart_value: Price::ZERO,
            item_count: 0,
        }
    }
}
