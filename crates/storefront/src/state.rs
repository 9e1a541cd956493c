//! Application state shared across handlers.

use std::sync::Arc;

use pideai_core::DefaultSelectionPolicy;

use crate::cart::CartRegistry;
use crate::catalog::Catalog;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// live carts and the catalog.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    carts: CartRegistry,
    catalog: Arc<dyn Catalog>,
    default_selection: DefaultSelectionPolicy,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        carts: CartRegistry,
        catalog: Arc<dyn Catalog>,
        default_selection: DefaultSelectionPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                carts,
                catalog,
                default_selection,
            }),
        }
    }

    /// Get a reference to the cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }

    /// Get a reference to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.catalog.as_ref()
    }

    /// Policy for the initial selection of a customization dialog.
    #[must_use]
    pub fn default_selection(&self) -> DefaultSelectionPolicy {
        self.inner.default_selection
    }
}
