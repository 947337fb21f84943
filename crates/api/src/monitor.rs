//! Periodic low-stock monitor.
//!
//! A read-only poller, deliberately outside the transaction core: it
//! opens a short transaction per tick, reports products at or below
//! their reorder threshold, and never writes anything.

use std::time::Duration;

use domain::Product;
use store::{Store, StoreError};

/// Polls the catalog forever, logging low-stock products and exporting
/// the count as a gauge.
pub async fn low_stock_monitor<S: Store>(store: S, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match poll_low_stock(&store).await {
            Ok(products) => {
                metrics::gauge!("low_stock_products").set(products.len() as f64);
                for product in &products {
                    tracing::warn!(
                        product_id = %product.id,
                        name = %product.name,
                        current_stock = product.current_stock,
                        min_stock = product.min_stock,
                        "product at or below reorder threshold"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "low-stock poll failed");
            }
        }
    }
}

async fn poll_low_stock<S: Store>(store: &S) -> Result<Vec<Product>, StoreError> {
    let mut tx = store.begin().await?;
    tx.low_stock_products().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_poll_reports_only_low_stock() {
        let store = InMemoryStore::new();
        store
            .insert_product(Product::new("Milk", Money::from_cents(250), 2, 5))
            .await;
        store
            .insert_product(Product::new("Rice", Money::from_cents(800), 50, 5))
            .await;

        let flagged = poll_low_stock(&store).await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].name, "Milk");
    }
}
