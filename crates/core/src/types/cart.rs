//! Cart line items and snapshots.
//!
//! The live cart state is owned by the cart store in the client crate; this
//! module holds the line-item shape and the derived-total arithmetic so the
//! store and the checkout service agree on one definition of "total".

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// One cart line: a product reference and a positive quantity.
///
/// A line with quantity 0 is never stored; reaching 0 removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartItem {
    /// Build a line for a catalog product.
    #[must_use]
    pub fn for_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An immutable copy of the cart at one instant.
///
/// Orders are created from snapshots, never from the live cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Price,
}

impl CartSnapshot {
    /// Snapshot a list of items, deriving the total.
    #[must_use]
    pub fn of(items: Vec<CartItem>) -> Self {
        let total = total_of(&items);
        Self { items, total }
    }

    /// Whether the snapshot holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The one definition of a cart total: sum of line totals.
#[must_use]
pub fn total_of(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, unit: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("product-{id}"),
            unit_price: Price::from(unit),
            quantity,
        }
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let items = vec![item(1, 100, 2), item(2, 30, 1)];
        assert_eq!(total_of(&items), Price::from(230));
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        assert_eq!(total_of(&[]), Price::zero());
        assert!(CartSnapshot::of(Vec::new()).is_empty());
    }

    #[test]
    fn test_snapshot_derives_total() {
        let snapshot = CartSnapshot::of(vec![item(1, 100, 2)]);
        assert_eq!(snapshot.total, Price::from(200));
    }
}
