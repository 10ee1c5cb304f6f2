//! Invoice models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single invoice line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub product: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
}

/// An invoice, computed once at creation time and stored immutably
///
/// grand_total = subtotal + subtotal × tax_rate / 100 − discount;
/// due = grand_total − paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub customer: String,
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
}

impl InvoiceRecord {
    pub fn tax_amount(&self) -> Decimal {
        self.subtotal * self.tax_rate / Decimal::from(100)
    }
}
