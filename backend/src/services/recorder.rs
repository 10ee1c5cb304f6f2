//! Transaction recorder
//!
//! Appends immutable purchase and sale records. Quantities and prices have
//! already been coerced by the normalizer; the recorder re-applies the same
//! policy as a guard (non-positive quantity falls back to 1, negative price
//! to 0) instead of rejecting, so a record is always written.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shared::{validate_quantity, validate_unit_price, PurchaseRecord, SaleRecord};

use crate::error::AppResult;
use crate::services::normalizer::{PurchaseFields, SaleFields};
use crate::store::{rows, schema, StoreHandle, TabularStore};

/// Generates unique, time-ordered record identifiers.
///
/// A bare timestamp id collides under rapid calls within one clock second;
/// the process-wide monotonic counter suffix keeps ids unique regardless of
/// clock resolution.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: `<prefix>-<compact UTC timestamp>-<sequence>`
    pub fn next_id(&self, prefix: &str, now: DateTime<Utc>) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{:04}", prefix, now.format("%Y%m%dT%H%M%S"), seq)
    }
}

/// Recorder for the append-only purchase and sale ledgers
#[derive(Clone)]
pub struct TransactionRecorder {
    store: StoreHandle,
    ids: Arc<IdGenerator>,
}

impl TransactionRecorder {
    pub fn new(store: StoreHandle, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Append a purchase record; returns the record with id and total
    pub async fn record_purchase(&self, fields: &PurchaseFields) -> AppResult<PurchaseRecord> {
        let quantity = if validate_quantity(fields.quantity).is_ok() {
            fields.quantity
        } else {
            Decimal::ONE
        };
        let unit_price = if validate_unit_price(fields.unit_price).is_ok() {
            fields.unit_price
        } else {
            Decimal::ZERO
        };

        let now = Utc::now();
        let record = PurchaseRecord {
            id: self.ids.next_id("P", now),
            timestamp: now,
            supplier_name: fields.supplier.clone(),
            product_name: fields.product.clone(),
            quantity,
            unit_price,
            total: quantity * unit_price,
            notes: fields.notes.clone(),
        };

        self.store
            .append_row(schema::PURCHASE, rows::purchase_row(&record))
            .await?;
        Ok(record)
    }

    /// Append a sale record. `purchase_price` is the cost basis captured at
    /// the moment of sale; profit may be negative for a loss-making sale.
    pub async fn record_sale(
        &self,
        fields: &SaleFields,
        purchase_price: Decimal,
    ) -> AppResult<SaleRecord> {
        let quantity = if validate_quantity(fields.quantity).is_ok() {
            fields.quantity
        } else {
            Decimal::ONE
        };
        let selling_price = if validate_unit_price(fields.selling_price).is_ok() {
            fields.selling_price
        } else {
            Decimal::ZERO
        };

        let now = Utc::now();
        let record = SaleRecord {
            id: self.ids.next_id("S", now),
            timestamp: now,
            customer_name: fields.customer.clone(),
            product_name: fields.product.clone(),
            quantity,
            unit_price: selling_price,
            total: quantity * selling_price,
            profit: (selling_price - purchase_price) * quantity,
            notes: fields.notes.clone(),
        };

        self.store
            .append_row(schema::SALES, rows::sale_row(&record))
            .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    fn purchase(product: &str, quantity: i64, price: i64) -> PurchaseFields {
        PurchaseFields {
            supplier: "Sharma Traders".to_string(),
            product: product.to_string(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(price),
            notes: String::new(),
        }
    }

    fn sale(product: &str, quantity: i64, price: i64) -> SaleFields {
        SaleFields {
            customer: "Rahul".to_string(),
            product: product.to_string(),
            quantity: Decimal::from(quantity),
            selling_price: Decimal::from(price),
            notes: String::new(),
        }
    }

    async fn recorder() -> TransactionRecorder {
        TransactionRecorder::new(
            Arc::new(MemoryStore::with_schema().await),
            Arc::new(IdGenerator::new()),
        )
    }

    #[tokio::test]
    async fn test_purchase_total() {
        let recorder = recorder().await;
        let record = recorder.record_purchase(&purchase("Pen", 10, 5)).await.unwrap();
        assert_eq!(record.total, Decimal::from(50));
        assert!(record.id.starts_with("P-"));
    }

    #[tokio::test]
    async fn test_sale_profit_is_margin_times_quantity() {
        let recorder = recorder().await;
        let record = recorder
            .record_sale(&sale("Pen", 3, 8), Decimal::from(5))
            .await
            .unwrap();
        assert_eq!(record.total, Decimal::from(24));
        assert_eq!(record.profit, Decimal::from(9));
    }

    #[tokio::test]
    async fn test_negative_profit_is_preserved() {
        let recorder = recorder().await;
        // Selling below cost: the loss must be recorded, not clamped
        let record = recorder
            .record_sale(&sale("Pen", 2, 4), Decimal::from(5))
            .await
            .unwrap();
        assert_eq!(record.profit, Decimal::from(-2));
    }

    #[tokio::test]
    async fn test_zero_cost_basis_counts_revenue_as_profit() {
        let recorder = recorder().await;
        let record = recorder
            .record_sale(&sale("Pen", 3, 8), Decimal::ZERO)
            .await
            .unwrap();
        assert_eq!(record.profit, Decimal::from(24));
    }

    #[tokio::test]
    async fn test_invalid_quantity_and_price_fall_back() {
        let recorder = recorder().await;
        let record = recorder.record_purchase(&purchase("Pen", 0, -5)).await.unwrap();
        assert_eq!(record.quantity, Decimal::ONE);
        assert_eq!(record.unit_price, Decimal::ZERO);
        assert_eq!(record.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_ids_unique_within_one_second() {
        let recorder = recorder().await;
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let record = recorder.record_purchase(&purchase("Pen", 1, 1)).await.unwrap();
            assert!(seen.insert(record.id.clone()), "duplicate id {}", record.id);
        }
    }

    #[test]
    fn test_id_generator_sequences() {
        let ids = IdGenerator::new();
        let now = Utc::now();
        let a = ids.next_id("P", now);
        let b = ids.next_id("P", now);
        assert_ne!(a, b);
        assert!(a < b);
    }
}
