//! Catalog products.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A product in the catalog.
///
/// `current_stock` is the only contended mutable field in the system;
/// every mutation to it goes through a store transaction and is paired
/// with a [`crate::StockHistoryEntry`]. `min_stock` is an advisory
/// reorder threshold and never blocks a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub current_stock: u32,
    pub min_stock: u32,
}

impl Product {
    /// Creates a new product with a random ID.
    pub fn new(name: impl Into<String>, price: Money, current_stock: u32, min_stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            current_stock,
            min_stock,
        }
    }

    /// Returns true if stock has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}
