//! Cart runtime.
//!
//! [`CartStore`] wraps the pure transitions from `pideai_core::cart` with the
//! things they deliberately leave out: the load lifecycle, background
//! persistence, analytics delivery and change notification.
//! [`CartRegistry`] keeps one live store per cart token.

mod registry;
mod store;

use std::sync::Arc;

use pideai_core::{CartLineItem, CartState, GroupError, GroupId, ModifierId, Price, ProductId};
use serde::Serialize;
use thiserror::Error;

use crate::analytics::AnalyticsSink;
use crate::catalog::{Catalog, CatalogError};
use crate::report::ErrorReporter;
use crate::storage::CartStorage;

pub use registry::CartRegistry;
pub use store::{CartPhase, CartStore};

/// Failures surfaced to the customer when confirming a configured item.
///
/// Storage and analytics faults never appear here; they are reported and
/// swallowed by the store.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The selection violates one or more group constraints.
    #[error("Selection rejected: {} group(s) invalid", .0.len())]
    SelectionRejected(Vec<GroupError>),

    /// An ungrouped modifier id that the product does not offer.
    #[error("Unknown modifier: {0}")]
    UnknownModifier(ModifierId),

    /// A selection entry for a group the product does not have.
    #[error("Unknown modifier group: {0}")]
    UnknownGroup(GroupId),

    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Collaborators a cart store is built from.
#[derive(Clone)]
pub struct CartDeps {
    pub storage: Arc<dyn CartStorage>,
    pub catalog: Arc<dyn Catalog>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub reporter: Arc<dyn ErrorReporter>,
}

/// Read-only view of a cart published after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub total_price: Price,
}

impl From<&CartState> for CartSnapshot {
    fn from(state: &CartState) -> Self {
        Self {
            items: state.items().to_vec(),
            total_items: state.total_items(),
            total_price: state.total_price(),
        }
    }
}
