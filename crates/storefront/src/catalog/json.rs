//! Catalog backed by a JSON document.
//!
//! # Format
//!
//! ```json
//! {
//!   "products": [
//!     {
//!       "id": "pizza",
//!       "name": "Margherita",
//!       "base_price": "10.00",
//!       "groups": [
//!         {
//!           "id": "size",
//!           "name": "Size",
//!           "selection_type": "single",
//!           "required": true,
//!           "min_selections": 1,
//!           "modifiers": [{ "id": "large", "name": "Large", "price": "2.50" }]
//!         }
//!       ],
//!       "ungrouped": [{ "id": "napkins", "name": "Napkins", "price": "0" }]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use pideai_core::{GroupId, GroupSchema, Modifier, ModifierGroup, Product, ProductId, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Catalog, CatalogError};

/// Top-level shape of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<CatalogEntry>,
}

/// One product with its groups and ungrouped modifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub groups: Vec<GroupSchema>,
    #[serde(default)]
    pub ungrouped: Vec<Modifier>,
}

/// In-memory catalog parsed from a [`CatalogFile`].
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    products: HashMap<ProductId, CatalogEntry>,
    groups: HashMap<GroupId, Vec<Modifier>>,
    order: Vec<ProductId>,
}

impl JsonCatalog {
    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path).await?;
        let file: CatalogFile = serde_json::from_slice(&bytes)?;
        Ok(Self::from_file(file))
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document has the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    /// Index a parsed catalog.
    ///
    /// Modifiers listed under a group without an explicit `group_id` are
    /// assigned to that group. Later duplicates of a product id replace
    /// earlier ones.
    #[must_use]
    pub fn from_file(file: CatalogFile) -> Self {
        let mut catalog = Self::default();
        for mut entry in file.products {
            for schema in &mut entry.groups {
                for modifier in &mut schema.modifiers {
                    if modifier.group_id.is_none() {
                        modifier.group_id = Some(schema.group.id.clone());
                    }
                }
                catalog
                    .groups
                    .insert(schema.group.id.clone(), schema.modifiers.clone());
            }
            let id = entry.product.id.clone();
            if catalog.products.insert(id.clone(), entry).is_none() {
                catalog.order.push(id);
            }
        }
        catalog
    }

    /// Products in file order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.order
            .iter()
            .filter_map(|id| self.products.get(id))
            .map(|entry| &entry.product)
    }

    /// Every schema problem in the catalog, per product.
    #[must_use]
    pub fn check(&self) -> Vec<(ProductId, SchemaError)> {
        self.order
            .iter()
            .filter_map(|id| self.products.get(id))
            .flat_map(|entry| {
                entry
                    .groups
                    .iter()
                    .flat_map(GroupSchema::check)
                    .map(|problem| (entry.product.id.clone(), problem))
            })
            .collect()
    }
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.get(id).map(|entry| entry.product.clone()))
    }

    async fn get_modifier_groups(&self, id: &ProductId) -> Result<Vec<ModifierGroup>, CatalogError> {
        Ok(self
            .products
            .get(id)
            .map(|entry| entry.groups.iter().map(|g| g.group.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_modifiers(&self, group_id: &GroupId) -> Result<Vec<Modifier>, CatalogError> {
        Ok(self.groups.get(group_id).cloned().unwrap_or_default())
    }

    async fn get_ungrouped_modifiers(&self, id: &ProductId) -> Result<Vec<Modifier>, CatalogError> {
        Ok(self
            .products
            .get(id)
            .map(|entry| entry.ungrouped.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pideai_core::SelectionType;
    use rust_decimal::Decimal;

    use super::*;

    const CATALOG: &str = r#"{
        "products": [
            {
                "id": "pizza",
                "name": "Margherita",
                "base_price": "10.00",
                "image_ref": "img/pizza.jpg",
                "groups": [
                    {
                        "id": "toppings",
                        "name": "Toppings",
                        "selection_type": "multiple",
                        "max_selections": 2,
                        "display_order": 2,
                        "modifiers": [
                            { "id": "olives", "name": "Olives", "price": "1.00", "display_order": 2 },
                            { "id": "ham", "name": "Ham", "price": "2.00", "display_order": 1 },
                            { "id": "anchovy", "name": "Anchovy", "price": "1.50", "available": false }
                        ]
                    },
                    {
                        "id": "size",
                        "name": "Size",
                        "selection_type": "single",
                        "required": true,
                        "min_selections": 1,
                        "display_order": 1,
                        "modifiers": [
                            { "id": "small", "name": "Small", "price": 0 },
                            { "id": "large", "name": "Large", "price": 2.5 }
                        ]
                    },
                    {
                        "id": "sauces",
                        "name": "Sauces",
                        "modifiers": [
                            { "id": "bbq", "name": "BBQ", "price": "0.50", "available": false }
                        ]
                    }
                ],
                "ungrouped": [
                    { "id": "napkins", "name": "Napkins", "price": "0" }
                ]
            },
            { "id": "soda", "name": "Soda", "base_price": 2 }
        ]
    }"#;

    #[tokio::test]
    async fn test_product_schema_is_normalized() {
        let catalog = JsonCatalog::from_json(CATALOG).unwrap();
        let schema = catalog
            .product_schema(&ProductId::new("pizza").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(schema.product.base_price.amount(), Decimal::new(1000, 2));
        let group_ids: Vec<&str> = schema
            .modifiers
            .groups
            .iter()
            .map(|g| g.group.id.as_str())
            .collect();
        assert_eq!(group_ids, ["size", "toppings"]);

        let toppings: Vec<&str> = schema.modifiers.groups[1]
            .modifiers
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(toppings, ["ham", "olives"]);
        assert_eq!(schema.modifiers.groups[0].group.selection_type, SelectionType::Single);
        assert_eq!(
            schema.modifiers.groups[0].modifiers[1].group_id,
            Some(GroupId::new("size").unwrap())
        );
        assert_eq!(schema.modifiers.ungrouped.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_is_none() {
        let catalog = JsonCatalog::from_json(CATALOG).unwrap();
        let schema = catalog
            .product_schema(&ProductId::new("nope").unwrap())
            .await
            .unwrap();
        assert!(schema.is_none());
    }

    #[tokio::test]
    async fn test_product_without_modifiers() {
        let catalog = JsonCatalog::from_json(CATALOG).unwrap();
        let schema = catalog
            .product_schema(&ProductId::new("soda").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(schema.modifiers.groups.is_empty());
        assert!(schema.modifiers.ungrouped.is_empty());
        assert_eq!(catalog.products().count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_group_is_skipped_and_checked() {
        let json = r#"{
            "products": [{
                "id": "p1", "name": "P", "base_price": "1",
                "groups": [{
                    "id": "g", "name": "G", "min_selections": 3, "max_selections": 1,
                    "modifiers": [{ "id": "m", "name": "M", "price": "0" }]
                }]
            }]
        }"#;
        let catalog = JsonCatalog::from_json(json).unwrap();

        let problems = catalog.check();
        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0].1, SchemaError::MinExceedsMax { min: 3, max: 1, .. }));

        let schema = catalog
            .product_schema(&ProductId::new("p1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(schema.modifiers.groups.is_empty());
    }

    #[test]
    fn test_rejects_negative_price() {
        let json = r#"{ "products": [{ "id": "p", "name": "P", "base_price": "-1" }] }"#;
        assert!(JsonCatalog::from_json(json).is_err());
    }
}
