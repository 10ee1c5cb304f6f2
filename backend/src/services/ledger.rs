//! Inventory ledger
//!
//! Maintains per-product quantity and last-known purchase price in the
//! `Inventory` collection. Product names match case-insensitively and
//! quantity never goes below zero: decreases clamp at zero.
//!
//! The remote store gives no transactional isolation, so every
//! read-modify-write runs under an in-process per-product lock. Writes for
//! different products proceed concurrently; two writers on the same product
//! are serialized.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use shared::{clamp_non_negative, InventoryItem};

use crate::error::AppResult;
use crate::store::{rows, schema, StoreHandle, TabularStore};

/// Default low-stock threshold, in units
pub const LOW_STOCK_THRESHOLD: u32 = 5;

// Inventory column positions (1-based)
const COL_QUANTITY: usize = 2;
const COL_PRICE: usize = 3;
const COL_UPDATED_AT: usize = 4;

/// Inventory ledger over the remote store
#[derive(Clone)]
pub struct InventoryLedger {
    store: StoreHandle,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl InventoryLedger {
    /// Create a new ledger instance
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, product: &str) -> Arc<Mutex<()>> {
        let key = product.trim().to_lowercase();
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn find_item(&self, product: &str) -> AppResult<Option<(usize, InventoryItem)>> {
        let records = self.store.read_all(schema::INVENTORY).await?;
        Ok(records.iter().find_map(|record| {
            let item = rows::inventory_item(record);
            item.matches(product).then_some((record.row_index, item))
        }))
    }

    /// Increase stock for a product, creating it on first reference.
    /// A provided price becomes the new last-known purchase price.
    pub async fn increase(
        &self,
        product: &str,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> AppResult<InventoryItem> {
        let lock = self.lock_for(product);
        let _guard = lock.lock().await;

        let now = Utc::now();
        match self.find_item(product).await? {
            Some((row, mut item)) => {
                item.quantity += quantity;
                item.updated_at = now;
                self.store
                    .update_cell(schema::INVENTORY, row, COL_QUANTITY, &item.quantity.to_string())
                    .await?;
                if let Some(price) = price {
                    item.last_price = price;
                    self.store
                        .update_cell(schema::INVENTORY, row, COL_PRICE, &price.to_string())
                        .await?;
                }
                self.store
                    .update_cell(schema::INVENTORY, row, COL_UPDATED_AT, &now.to_rfc3339())
                    .await?;
                Ok(item)
            }
            None => {
                let item = InventoryItem {
                    product_name: product.trim().to_string(),
                    quantity: clamp_non_negative(quantity),
                    last_price: price.unwrap_or(Decimal::ZERO),
                    updated_at: now,
                };
                self.store
                    .append_row(schema::INVENTORY, rows::inventory_row(&item))
                    .await?;
                Ok(item)
            }
        }
    }

    /// Decrease stock for a product, clamping at zero.
    /// Returns `None` when the product is unknown: the caller decides
    /// whether that is fatal. No phantom stock is ever created.
    pub async fn decrease(
        &self,
        product: &str,
        quantity: Decimal,
    ) -> AppResult<Option<InventoryItem>> {
        let lock = self.lock_for(product);
        let _guard = lock.lock().await;

        let Some((row, mut item)) = self.find_item(product).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        item.quantity = clamp_non_negative(item.quantity - quantity);
        item.updated_at = now;
        self.store
            .update_cell(schema::INVENTORY, row, COL_QUANTITY, &item.quantity.to_string())
            .await?;
        self.store
            .update_cell(schema::INVENTORY, row, COL_UPDATED_AT, &now.to_rfc3339())
            .await?;
        Ok(Some(item))
    }

    /// Overwrite quantity and price for a product, creating it if missing
    pub async fn set_stock(
        &self,
        product: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> AppResult<InventoryItem> {
        let lock = self.lock_for(product);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let item = InventoryItem {
            product_name: product.trim().to_string(),
            quantity: clamp_non_negative(quantity),
            last_price: price,
            updated_at: now,
        };
        match self.find_item(product).await? {
            Some((row, _)) => {
                self.store
                    .update_cell(schema::INVENTORY, row, COL_QUANTITY, &item.quantity.to_string())
                    .await?;
                self.store
                    .update_cell(schema::INVENTORY, row, COL_PRICE, &item.last_price.to_string())
                    .await?;
                self.store
                    .update_cell(schema::INVENTORY, row, COL_UPDATED_AT, &now.to_rfc3339())
                    .await?;
            }
            None => {
                self.store
                    .append_row(schema::INVENTORY, rows::inventory_row(&item))
                    .await?;
            }
        }
        Ok(item)
    }

    /// Last-known purchase price, the cost basis for profit at sale time.
    /// Unknown products price at zero, so an unstocked sale counts its
    /// whole revenue as profit.
    pub async fn lookup_price(&self, product: &str) -> AppResult<Decimal> {
        Ok(self
            .find_item(product)
            .await?
            .map(|(_, item)| item.last_price)
            .unwrap_or(Decimal::ZERO))
    }

    /// All inventory items in store order
    pub async fn get_all(&self) -> AppResult<Vec<InventoryItem>> {
        let records = self.store.read_all(schema::INVENTORY).await?;
        Ok(records.iter().map(rows::inventory_item).collect())
    }

    /// Items at or below the threshold (equal counts as low)
    pub async fn low_stock(&self, threshold: Decimal) -> AppResult<Vec<InventoryItem>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|item| item.quantity <= threshold)
            .collect())
    }
}
