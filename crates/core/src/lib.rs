//! PideAI Core - Cart and modifier-selection engine.
//!
//! This crate holds the parts of the storefront cart that have real rules:
//! deterministic line-item identity, the pure cart transitions, and the
//! validator that checks a customer's modifier choices before they become a
//! line item.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no clocks. Transitions return the effects they need (persist,
//! delete, track) and the storefront runtime carries them out.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids and prices
//! - [`modifier`] - Modifier groups and their bounds
//! - [`catalog`] - Products and their customization schema
//! - [`selection`] - In-progress modifier choices
//! - [`validator`] - Default selection, validation, pricing, resolution
//! - [`cart`] - Line items, identity, transitions, analytics events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod modifier;
pub mod selection;
pub mod types;
pub mod validator;

pub use cart::{
    CartAction, CartEffect, CartEvent, CartEventKind, CartLineItem, CartState, ChosenModifier,
    NewLineItem, cart_item_id,
};
pub use catalog::{ModifierSchema, Product, ProductSchema};
pub use modifier::{GroupSchema, Modifier, ModifierGroup, SchemaError, SelectionType};
pub use selection::Selection;
pub use types::*;
pub use validator::{
    DefaultSelectionPolicy, GroupError, ValidationResult, Violation, default_selection,
    price_delta, resolve, toggle, validate,
};
