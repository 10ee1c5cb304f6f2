//! Invoice service
//!
//! Computes an invoice once from normalized line items and persists it
//! immutably. Rendering to PDF happens afterwards and cannot change the
//! stored amounts.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use shared::InvoiceRecord;

use crate::error::AppResult;
use crate::services::normalizer::InvoiceFields;
use crate::services::recorder::IdGenerator;
use crate::store::{rows, schema, StoreHandle, TabularStore};

#[derive(Clone)]
pub struct InvoiceService {
    store: StoreHandle,
    ids: Arc<IdGenerator>,
}

impl InvoiceService {
    pub fn new(store: StoreHandle, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Compute and persist an invoice
    pub async fn create(&self, fields: &InvoiceFields) -> AppResult<InvoiceRecord> {
        let subtotal: Decimal = fields.items.iter().map(|item| item.total).sum();
        let tax_amount = subtotal * fields.tax_rate / Decimal::from(100);
        let grand_total = subtotal + tax_amount - fields.discount;
        let due = grand_total - fields.paid;

        let now = Utc::now();
        let record = InvoiceRecord {
            id: self.ids.next_id("INV", now),
            date: now,
            customer: fields.customer.clone(),
            line_items: fields.items.clone(),
            subtotal,
            tax_rate: fields.tax_rate,
            discount: fields.discount,
            grand_total,
            paid: fields.paid,
            due,
        };

        self.store
            .append_row(schema::INVOICE, rows::invoice_row(&record))
            .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::InvoiceLineItem;

    fn line(product: &str, quantity: i64, price: i64) -> InvoiceLineItem {
        InvoiceLineItem {
            product: product.to_string(),
            quantity: Decimal::from(quantity),
            price: Decimal::from(price),
            total: Decimal::from(quantity * price),
        }
    }

    #[tokio::test]
    async fn test_invoice_totals() {
        let service = InvoiceService::new(
            Arc::new(MemoryStore::with_schema().await),
            Arc::new(IdGenerator::new()),
        );

        let record = service
            .create(&InvoiceFields {
                customer: "Acme".to_string(),
                items: vec![line("Laptop", 2, 45000), line("Mouse", 1, 500)],
                tax_rate: Decimal::from(18),
                discount: Decimal::from(500),
                paid: Decimal::from(50000),
            })
            .await
            .unwrap();

        assert_eq!(record.subtotal, Decimal::from(90500));
        assert_eq!(record.tax_amount(), Decimal::from(16290));
        assert_eq!(record.grand_total, Decimal::from(106290));
        assert_eq!(record.due, Decimal::from(56290));
        assert!(record.id.starts_with("INV-"));
    }

    #[tokio::test]
    async fn test_invoice_round_trips_items_json() {
        let store = Arc::new(MemoryStore::with_schema().await);
        let service = InvoiceService::new(store.clone(), Arc::new(IdGenerator::new()));

        let record = service
            .create(&InvoiceFields {
                customer: "Acme".to_string(),
                items: vec![line("Pen", 10, 5)],
                tax_rate: Decimal::ZERO,
                discount: Decimal::ZERO,
                paid: Decimal::ZERO,
            })
            .await
            .unwrap();

        let stored = store.read_all(schema::INVOICE).await.unwrap();
        let read_back = rows::invoice_record(&stored[0]);
        assert_eq!(read_back.id, record.id);
        assert_eq!(read_back.line_items, record.line_items);
        assert_eq!(read_back.grand_total, Decimal::from(50));
    }
}
