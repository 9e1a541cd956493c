//! Product and customization schema as consumed from the catalog.

use serde::{Deserialize, Serialize};

use crate::modifier::{GroupSchema, Modifier};
use crate::types::{GroupId, ModifierId, Price, ProductId};

/// A sellable product as far as the cart is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub base_price: Price,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Everything a customer can choose on top of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSchema {
    /// Groups in declaration (display) order.
    #[serde(default)]
    pub groups: Vec<GroupSchema>,
    /// Ungrouped modifiers, always optional.
    #[serde(default)]
    pub ungrouped: Vec<Modifier>,
}

impl ModifierSchema {
    /// Look up a group by id.
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&GroupSchema> {
        self.groups.iter().find(|g| &g.group.id == id)
    }

    /// Look up an available ungrouped modifier by id.
    #[must_use]
    pub fn ungrouped_available(&self, id: &ModifierId) -> Option<&Modifier> {
        self.ungrouped.iter().find(|m| m.available && &m.id == id)
    }

    /// Normalize catalog output for display and validation.
    ///
    /// Sorts groups and modifiers by `display_order` (stable), drops
    /// unavailable modifiers and groups left without any modifier.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for schema in &mut self.groups {
            schema.modifiers.retain(|m| m.available);
            schema.modifiers.sort_by_key(|m| m.display_order);
        }
        self.groups.retain(|g| !g.modifiers.is_empty());
        self.groups.sort_by_key(|g| g.group.display_order);
        self.ungrouped.retain(|m| m.available);
        self.ungrouped.sort_by_key(|m| m.display_order);
        self
    }
}

/// A product together with its customization schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSchema {
    pub product: Product,
    #[serde(flatten)]
    pub modifiers: ModifierSchema,
}
