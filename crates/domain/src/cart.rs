//! Shopping carts.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// A line item in a cart.
///
/// `unit_price` is the product's price captured when the item was
/// added. Checkout trusts this snapshot for pricing but never for
/// stock, which is always re-read live inside the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Creates a new cart line item.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Errors that can occur when mutating a cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product is not in the cart.
    #[error("item not found in cart: {product_id}")]
    ItemNotFound { product_id: ProductId },

    /// Quantities must be at least 1.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}

/// A user's shopping cart: an ordered list of line items.
///
/// Cleared atomically when a checkout commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    user: UserId,
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart for a user or anonymous session.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            items: Vec::new(),
        }
    }

    /// Reassembles a cart from persisted parts.
    pub fn from_parts(user: UserId, items: Vec<CartItem>) -> Self {
        Self { user, items }
    }

    /// Returns the cart owner.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Returns the line items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of all line totals at their snapshot prices.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |total, item| total + item.line_total())
    }

    /// Adds an item, merging quantities if the product is already present.
    ///
    /// A merge keeps the existing price snapshot; the price a product had
    /// when it first entered the cart is the one checkout will charge.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
        Ok(())
    }

    /// Sets the quantity of an existing line item.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotFound { product_id })?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line item.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(CartError::ItemNotFound { product_id });
        }
        Ok(())
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with_item(quantity: u32) -> (Cart, ProductId) {
        let product_id = ProductId::new();
        let mut cart = Cart::new(UserId::new("user-1"));
        cart.add_item(CartItem::new(
            product_id,
            "Milk",
            quantity,
            Money::from_cents(250),
        ))
        .unwrap();
        (cart, product_id)
    }

    #[test]
    fn test_add_item_merges_same_product() {
        let (mut cart, product_id) = cart_with_item(2);
        cart.add_item(CartItem::new(product_id, "Milk", 3, Money::from_cents(250)))
            .unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_merge_keeps_original_price_snapshot() {
        let (mut cart, product_id) = cart_with_item(1);
        // Price went up since the first add; the snapshot wins.
        cart.add_item(CartItem::new(product_id, "Milk", 1, Money::from_cents(300)))
            .unwrap();

        assert_eq!(cart.items()[0].unit_price, Money::from_cents(250));
        assert_eq!(cart.subtotal(), Money::from_cents(500));
    }

    #[test]
    fn test_add_item_rejects_zero_quantity() {
        let mut cart = Cart::new(UserId::new("user-1"));
        let result = cart.add_item(CartItem::new(
            ProductId::new(),
            "Milk",
            0,
            Money::from_cents(250),
        ));
        assert!(matches!(result, Err(CartError::InvalidQuantity { .. })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity() {
        let (mut cart, product_id) = cart_with_item(2);
        cart.update_quantity(product_id, 7).unwrap();
        assert_eq!(cart.items()[0].quantity, 7);

        let missing = cart.update_quantity(ProductId::new(), 1);
        assert!(matches!(missing, Err(CartError::ItemNotFound { .. })));

        let zero = cart.update_quantity(product_id, 0);
        assert!(matches!(zero, Err(CartError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_remove_item() {
        let (mut cart, product_id) = cart_with_item(2);
        cart.remove_item(product_id).unwrap();
        assert!(cart.is_empty());

        let again = cart.remove_item(product_id);
        assert!(matches!(again, Err(CartError::ItemNotFound { .. })));
    }

    #[test]
    fn test_clear_empties_cart() {
        let (mut cart, _) = cart_with_item(2);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }
}
