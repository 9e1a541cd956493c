//! Cart line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::identity::cart_item_id;
use crate::types::{CartItemId, GroupId, ModifierId, Price, ProductId};

/// A modifier as recorded on a line item.
///
/// Name and price are snapshots taken when the item was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenModifier {
    pub id: ModifierId,
    pub name: String,
    pub price: Price,
    /// Group the modifier was chosen in, `None` for ungrouped modifiers.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub group_name: Option<String>,
}

/// Input to an add-to-cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    pub base_price: Price,
    #[serde(default)]
    pub modifiers: Vec<ChosenModifier>,
}

impl NewLineItem {
    /// Identity this configuration collapses into.
    #[must_use]
    pub fn cart_item_id(&self) -> CartItemId {
        cart_item_id(&self.product_id, &self.modifiers)
    }
}

/// One distinct product configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Base price at the time the item was first added.
    pub unit_base_price: Price,
    /// Always at least one while the item is in a cart.
    pub quantity: u32,
    #[serde(default)]
    pub modifiers: Vec<ChosenModifier>,
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    /// Create a line item with quantity one.
    #[must_use]
    pub fn new(item: NewLineItem, added_at: DateTime<Utc>) -> Self {
        Self {
            cart_item_id: item.cart_item_id(),
            product_id: item.product_id,
            name: item.name,
            image_ref: item.image_ref,
            unit_base_price: item.base_price,
            quantity: 1,
            modifiers: item.modifiers,
            added_at,
        }
    }

    /// Sum of the chosen modifiers' prices.
    #[must_use]
    pub fn modifiers_price(&self) -> Price {
        self.modifiers.iter().map(|m| m.price).sum()
    }

    /// Price of one unit including modifiers.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.unit_base_price + self.modifiers_price()
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn new_item() -> NewLineItem {
        NewLineItem {
            product_id: ProductId::new("p1").unwrap(),
            name: "Pizza".to_string(),
            image_ref: None,
            base_price: Price::from_cents(1000).unwrap(),
            modifiers: vec![
                ChosenModifier {
                    id: ModifierId::new("e2").unwrap(),
                    name: "Pepperoni".to_string(),
                    price: Price::from_cents(300).unwrap(),
                    group_id: None,
                    group_name: None,
                },
                ChosenModifier {
                    id: ModifierId::new("e1").unwrap(),
                    name: "Cheese".to_string(),
                    price: Price::from_cents(200).unwrap(),
                    group_id: Some(GroupId::new("g").unwrap()),
                    group_name: Some("Extras".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_new_line_item_starts_at_one() {
        let item = CartLineItem::new(new_item(), Utc::now());
        assert_eq!(item.quantity, 1);
        assert_eq!(item.cart_item_id.as_str(), "p1::e1,e2");
    }

    #[test]
    fn test_prices() {
        let mut item = CartLineItem::new(new_item(), Utc::now());
        item.quantity = 3;
        assert_eq!(item.modifiers_price().amount(), Decimal::new(500, 2));
        assert_eq!(item.unit_price().amount(), Decimal::new(1500, 2));
        assert_eq!(item.line_total().amount(), Decimal::new(4500, 2));
    }

    #[test]
    fn test_serde_preserves_fields() {
        let item = CartLineItem::new(new_item(), Utc::now());
        let json = serde_json::to_string(&item).unwrap();
        let parsed: CartLineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }
}
