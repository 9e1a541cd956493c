//! Line-item identity.

use crate::cart::ChosenModifier;
use crate::types::{CartItemId, ProductId};

/// Separator between product id and modifier ids.
pub const PRODUCT_SEPARATOR: &str = "::";

/// Separator between modifier ids.
pub const MODIFIER_SEPARATOR: &str = ",";

/// Derive the identity of a product configuration.
///
/// Without modifiers the identity is the product id itself. Otherwise it is
/// `"{product}::{ids}"` with the modifier ids sorted, so the order in which
/// modifiers were picked never matters.
///
/// ```
/// use pideai_core::{ChosenModifier, ModifierId, Price, ProductId, cart_item_id};
///
/// let extra = |id: &str| ChosenModifier {
///     id: ModifierId::new(id).unwrap(),
///     name: id.to_string(),
///     price: Price::ZERO,
///     group_id: None,
///     group_name: None,
/// };
/// let product = ProductId::new("p1").unwrap();
///
/// assert_eq!(cart_item_id(&product, &[]).as_str(), "p1");
/// assert_eq!(
///     cart_item_id(&product, &[extra("e2"), extra("e1")]).as_str(),
///     "p1::e1,e2"
/// );
/// ```
#[must_use]
pub fn cart_item_id(product_id: &ProductId, modifiers: &[ChosenModifier]) -> CartItemId {
    let id = if modifiers.is_empty() {
        product_id.as_str().to_string()
    } else {
        let mut ids: Vec<&str> = modifiers.iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        format!(
            "{product_id}{PRODUCT_SEPARATOR}{}",
            ids.join(MODIFIER_SEPARATOR)
        )
    };

    // Product ids are never blank, so neither is the derived id.
    CartItemId::new(id).unwrap_or_else(|_| unreachable!("derived from a non-empty product id"))
}
