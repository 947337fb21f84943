//! Cart operations.

use common::{ProductId, UserId};
use domain::{Cart, CartItem};
use store::Store;

use crate::error::{CheckoutError, Result};

/// Service for cart mutations.
///
/// Adding an item captures the product's *current* price as the line's
/// snapshot; that snapshot is what checkout later charges, even if the
/// catalog price changes in between. Stock is deliberately not checked
/// here: sufficiency is only decided inside the checkout transaction.
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, or an empty one if none exists yet.
    pub async fn cart(&self, user: &UserId) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .cart(user)
            .await?
            .unwrap_or_else(|| Cart::new(user.clone())))
    }

    /// Adds a quantity of a product to the cart.
    #[tracing::instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn add_item(
        &self,
        user: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut tx = self.store.begin().await?;

        let product = tx
            .product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        let mut cart = tx
            .cart(user)
            .await?
            .unwrap_or_else(|| Cart::new(user.clone()));

        cart.add_item(CartItem::new(
            product.id,
            product.name.clone(),
            quantity,
            product.price,
        ))?;

        tx.save_cart(&cart).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Sets the quantity of a line already in the cart.
    #[tracing::instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        user: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut tx = self.store.begin().await?;

        let mut cart = tx
            .cart(user)
            .await?
            .ok_or(domain::CartError::ItemNotFound { product_id })?;

        cart.update_quantity(product_id, quantity)?;

        tx.save_cart(&cart).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn remove_item(&self, user: &UserId, product_id: ProductId) -> Result<Cart> {
        let mut tx = self.store.begin().await?;

        let mut cart = tx
            .cart(user)
            .await?
            .ok_or(domain::CartError::ItemNotFound { product_id })?;

        cart.remove_item(product_id)?;

        tx.save_cart(&cart).await?;
        tx.commit().await?;
        Ok(cart)
    }
}
