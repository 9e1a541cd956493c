//! Shopping cart domain.
//!
//! - [`line_item`] - Line items and the modifiers chosen for them
//! - [`identity`] - Deterministic line-item identity
//! - [`state`] - Pure cart transitions and the effects they request
//! - [`event`] - Analytics event schema

pub mod event;
pub mod identity;
pub mod line_item;
pub mod state;

pub use event::{CartEvent, CartEventKind};
pub use identity::cart_item_id;
pub use line_item::{CartLineItem, ChosenModifier, NewLineItem};
pub use state::{CartAction, CartEffect, CartState};
