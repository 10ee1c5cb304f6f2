//! Purchase and sale records
//!
//! Both are append-only: once recorded they are never mutated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An immutable purchase record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub supplier_name: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub notes: String,
}

/// An immutable sale record
///
/// Profit is a point-in-time estimate: the cost basis is the product's
/// last-known purchase price at the moment of sale, not a FIFO/LIFO layer.
/// Negative profit is allowed and signals a loss-making sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub profit: Decimal,
    pub notes: String,
}
