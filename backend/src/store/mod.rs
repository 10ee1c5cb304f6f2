//! Remote tabular store abstraction
//!
//! The system of record is a remote spreadsheet-like service. Everything the
//! backend needs from it reduces to four primitives: append a row, read all
//! rows as records, update a single cell, and create a collection with a
//! header. "Find row by key" is layered on read-all in the services.
//!
//! Data rows start at row 2; row/column indices are 1-based, matching the
//! remote service's addressing.

mod memory;
pub mod rows;
mod sheets;

pub use memory::MemoryStore;
pub use sheets::SheetsClient;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::parse_decimal_or;

use crate::error::AppResult;

/// First data row in a collection (row 1 is the header)
pub const FIRST_DATA_ROW: usize = 2;

/// A row read back from a collection, keyed by header column names
#[derive(Debug, Clone)]
pub struct Record {
    /// 1-based row index in the collection
    pub row_index: usize,
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new(row_index: usize, fields: HashMap<String, String>) -> Self {
        Self { row_index, fields }
    }

    /// Cell value for a column, empty string when absent
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Cell value parsed as a decimal, falling back to a default
    pub fn decimal(&self, column: &str, default: Decimal) -> Decimal {
        parse_decimal_or(self.get(column), default)
    }
}

/// The four primitives the remote tabular store exposes
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Append a row at the end of a collection
    async fn append_row(&self, collection: &str, row: Vec<String>) -> AppResult<()>;

    /// Read every data row of a collection as header-keyed records
    async fn read_all(&self, collection: &str) -> AppResult<Vec<Record>>;

    /// Overwrite a single cell (1-based row and column)
    async fn update_cell(
        &self,
        collection: &str,
        row: usize,
        column: usize,
        value: &str,
    ) -> AppResult<()>;

    /// Create a collection with the given header row; idempotent
    async fn create_collection(&self, collection: &str, header: &[&str]) -> AppResult<()>;
}

/// Shared handle to the configured store implementation
pub type StoreHandle = Arc<dyn TabularStore>;

/// Collection names and persisted column layouts.
///
/// The layouts are a compatibility surface: existing spreadsheets written by
/// earlier versions of the assistant must keep reading back correctly.
pub mod schema {
    pub const INVENTORY: &str = "Inventory";
    pub const PURCHASE: &str = "Purchase";
    pub const SALES: &str = "Sales";
    pub const CRM: &str = "CRM";
    pub const INVOICE: &str = "Invoice";
    pub const SERVICE_HISTORY: &str = "ServiceHistory";
    pub const MEMORY: &str = "Memory";
    pub const CUSTOMER: &str = "Customer";
    pub const FINANCE: &str = "Finance";
    pub const TASK: &str = "Task";
    pub const REPORT: &str = "Report";

    pub const INVENTORY_HEADER: &[&str] = &["Product", "Quantity", "Price", "UpdatedAt"];
    pub const PURCHASE_HEADER: &[&str] = &[
        "PurchaseID",
        "Date",
        "Supplier",
        "Product",
        "Quantity",
        "PriceEach",
        "Total",
        "Notes",
    ];
    pub const SALES_HEADER: &[&str] = &[
        "SaleID",
        "Date",
        "Customer",
        "Product",
        "Quantity",
        "PriceEach",
        "Total",
        "Profit",
        "Notes",
    ];
    pub const CRM_HEADER: &[&str] = &[
        "Customer",
        "Phone",
        "Email",
        "LastVisit",
        "TotalPurchases",
        "TotalSpent",
        "TotalProfit",
        "Notes",
        "Tags",
    ];
    pub const INVOICE_HEADER: &[&str] = &[
        "InvoiceID",
        "Date",
        "Customer",
        "ItemsJSON",
        "Subtotal",
        "TaxRate",
        "Discount",
        "GrandTotal",
        "Paid",
        "Due",
    ];
    pub const SERVICE_HISTORY_HEADER: &[&str] = &[
        "ServiceID",
        "Date",
        "Customer",
        "Device",
        "Problem",
        "Status",
        "Cost",
        "Technician",
        "Notes",
    ];
    pub const MEMORY_HEADER: &[&str] = &["UserID", "Timestamp", "Role", "Text"];
    pub const CUSTOMER_HEADER: &[&str] = &["Name", "Email", "Phone", "Company", "CreatedAt"];
    pub const FINANCE_HEADER: &[&str] = &["Customer", "Amount", "Type", "Date", "Notes"];
    pub const TASK_HEADER: &[&str] = &["TaskName", "AssignedTo", "Status", "CreatedAt"];
    pub const REPORT_HEADER: &[&str] = &["Timestamp", "Text"];

    /// Every collection paired with its header, in creation order
    pub const ALL: &[(&str, &[&str])] = &[
        (INVENTORY, INVENTORY_HEADER),
        (PURCHASE, PURCHASE_HEADER),
        (SALES, SALES_HEADER),
        (CRM, CRM_HEADER),
        (INVOICE, INVOICE_HEADER),
        (SERVICE_HISTORY, SERVICE_HISTORY_HEADER),
        (MEMORY, MEMORY_HEADER),
        (CUSTOMER, CUSTOMER_HEADER),
        (FINANCE, FINANCE_HEADER),
        (TASK, TASK_HEADER),
        (REPORT, REPORT_HEADER),
    ];
}

/// Ensure every collection exists with its expected header.
/// Run once at startup, before the server starts accepting messages.
pub async fn ensure_collections(store: &dyn TabularStore) -> AppResult<()> {
    for (collection, header) in schema::ALL {
        store.create_collection(collection, header).await?;
    }
    Ok(())
}
