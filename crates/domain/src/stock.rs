//! Stock mutations and the append-only audit trail.
//!
//! Every change to a product's stock counter goes through one of the
//! helpers in this module, which mutate the product and produce the
//! matching [`StockHistoryEntry`] in a single step so the two can never
//! drift apart.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::product::Product;

/// The kind of stock mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockChange {
    /// Stock increased (restock or restored by a cancellation).
    Add,
    /// Stock decreased (sold at checkout).
    Remove,
    /// Stock set to an absolute level by an operator.
    Adjust,
    /// Stock written off past its expiry date.
    Expire,
}

impl StockChange {
    /// Returns the change type as its wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChange::Add => "add",
            StockChange::Remove => "remove",
            StockChange::Adjust => "adjust",
            StockChange::Expire => "expire",
        }
    }
}

impl std::fmt::Display for StockChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StockChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(StockChange::Add),
            "remove" => Ok(StockChange::Remove),
            "adjust" => Ok(StockChange::Adjust),
            "expire" => Ok(StockChange::Expire),
            other => Err(format!("invalid stock change type: {other}")),
        }
    }
}

/// One row of the append-only stock audit trail.
///
/// Invariant: `new_stock` differs from `previous_stock` by exactly
/// `quantity`, in the direction `change` implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHistoryEntry {
    pub id: Uuid,
    pub product_id: ProductId,
    pub change: StockChange,
    pub quantity: u32,
    pub previous_stock: u32,
    pub new_stock: u32,
    pub notes: Option<String>,
    pub performed_by: UserId,
    pub recorded_at: DateTime<Utc>,
}

impl StockHistoryEntry {
    fn record(
        product_id: ProductId,
        change: StockChange,
        quantity: u32,
        previous_stock: u32,
        new_stock: u32,
        notes: Option<String>,
        performed_by: &UserId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            change,
            quantity,
            previous_stock,
            new_stock,
            notes,
            performed_by: performed_by.clone(),
            recorded_at: Utc::now(),
        }
    }

    /// Checks the before/after/quantity arithmetic against the change type.
    pub fn is_consistent(&self) -> bool {
        match self.change {
            StockChange::Add => self.previous_stock + self.quantity == self.new_stock,
            StockChange::Remove | StockChange::Expire => {
                self.previous_stock
                    .checked_sub(self.quantity)
                    .is_some_and(|remaining| remaining == self.new_stock)
            }
            StockChange::Adjust => {
                self.previous_stock.abs_diff(self.new_stock) == self.quantity
            }
        }
    }
}

/// Errors that can occur when mutating stock.
#[derive(Debug, Error)]
pub enum StockError {
    /// The product does not hold enough stock to cover the request.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Stock changes of zero units are meaningless and not recorded.
    #[error("stock change quantity must be greater than 0")]
    ZeroQuantity,

    /// The adjustment target equals the current level.
    #[error("stock level is already {level}")]
    NoChange { level: u32 },
}

/// Decrements a product's stock, failing if not enough is available.
///
/// The caller must have re-read the product inside the surrounding
/// transaction; the sufficiency check here is only as good as the
/// freshness of `product.current_stock`.
pub fn remove_stock(
    product: &mut Product,
    quantity: u32,
    notes: Option<String>,
    performed_by: &UserId,
) -> Result<StockHistoryEntry, StockError> {
    if quantity == 0 {
        return Err(StockError::ZeroQuantity);
    }

    let previous = product.current_stock;
    let remaining = previous
        .checked_sub(quantity)
        .ok_or(StockError::InsufficientStock {
            product_id: product.id,
            requested: quantity,
            available: previous,
        })?;

    product.current_stock = remaining;
    Ok(StockHistoryEntry::record(
        product.id,
        StockChange::Remove,
        quantity,
        previous,
        remaining,
        notes,
        performed_by,
    ))
}

/// Increments a product's stock.
pub fn restore_stock(
    product: &mut Product,
    quantity: u32,
    notes: Option<String>,
    performed_by: &UserId,
) -> Result<StockHistoryEntry, StockError> {
    if quantity == 0 {
        return Err(StockError::ZeroQuantity);
    }

    let previous = product.current_stock;
    product.current_stock = previous + quantity;
    Ok(StockHistoryEntry::record(
        product.id,
        StockChange::Add,
        quantity,
        previous,
        product.current_stock,
        notes,
        performed_by,
    ))
}

/// Sets a product's stock to an absolute level.
pub fn adjust_stock(
    product: &mut Product,
    new_level: u32,
    notes: Option<String>,
    performed_by: &UserId,
) -> Result<StockHistoryEntry, StockError> {
    let previous = product.current_stock;
    if new_level == previous {
        return Err(StockError::NoChange { level: previous });
    }

    product.current_stock = new_level;
    Ok(StockHistoryEntry::record(
        product.id,
        StockChange::Adjust,
        previous.abs_diff(new_level),
        previous,
        new_level,
        notes,
        performed_by,
    ))
}
