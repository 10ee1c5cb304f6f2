//! Inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stocked product in the inventory ledger
///
/// The product name is the key and matches case-insensitively; quantity is
/// never negative. `last_price` is the most recent purchase price and is
/// used as the cost basis when the product is sold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub product_name: String,
    pub quantity: Decimal,
    pub last_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Case-insensitive key match against another product name
    pub fn matches(&self, product: &str) -> bool {
        self.product_name.trim().to_lowercase() == product.trim().to_lowercase()
    }
}
