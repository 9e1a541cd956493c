//! Catalog lookups consumed by the cart.
//!
//! The catalog is the source of truth for products, their modifier groups
//! and their modifiers. The cart only reads from it.
//!
//! - [`JsonCatalog`] - catalog loaded from a JSON file
//! - [`CachedCatalog`] - wraps any catalog with a 5-minute schema cache

mod cached;
mod json;

use async_trait::async_trait;
use pideai_core::{
    GroupId, GroupSchema, Modifier, ModifierGroup, ModifierSchema, Product, ProductId,
    ProductSchema,
};
use thiserror::Error;
use tracing::warn;

pub use cached::CachedCatalog;
pub use json::{CatalogEntry, CatalogFile, JsonCatalog};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog source is not valid JSON for the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog backend failed.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read access to products and their customization options.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a product.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Modifier groups attached to a product, in any order.
    async fn get_modifier_groups(&self, id: &ProductId) -> Result<Vec<ModifierGroup>, CatalogError>;

    /// Modifiers belonging to a group, in any order.
    async fn get_modifiers(&self, group_id: &GroupId) -> Result<Vec<Modifier>, CatalogError>;

    /// Modifiers of a product that belong to no group.
    async fn get_ungrouped_modifiers(&self, id: &ProductId) -> Result<Vec<Modifier>, CatalogError>;

    /// Assemble a product with everything the customer can choose.
    ///
    /// Groups and modifiers come back sorted by display order, unavailable
    /// modifiers and empty groups are dropped, and groups whose bounds cannot
    /// be satisfied are logged and left out. `None` if the product is unknown.
    async fn product_schema(&self, id: &ProductId) -> Result<Option<ProductSchema>, CatalogError> {
        let Some(product) = self.get_product(id).await? else {
            return Ok(None);
        };

        let mut groups = Vec::new();
        for group in self.get_modifier_groups(id).await? {
            let modifiers = self.get_modifiers(&group.id).await?;
            let schema = GroupSchema { group, modifiers };
            let problems = schema.check();
            if problems.is_empty() {
                groups.push(schema);
            } else {
                for problem in &problems {
                    warn!(product_id = %id, error = %problem, "Skipping invalid modifier group");
                }
            }
        }
        let ungrouped = self.get_ungrouped_modifiers(id).await?;

        Ok(Some(ProductSchema {
            product,
            modifiers: ModifierSchema { groups, ungrouped }.normalized(),
        }))
    }
}
