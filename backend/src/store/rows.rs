//! Row codecs between store records and domain models
//!
//! The remote store holds free-form strings; these helpers are the single
//! place where cell text becomes typed models and back. Reads are lenient
//! (blank or garbled cells fall back to defaults), writes are canonical
//! (RFC 3339 timestamps, plain decimal rendering).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use shared::{
    EntityProfile, FinanceRecord, InventoryItem, InvoiceLineItem, InvoiceRecord, MemoryEntry,
    MemoryRole, PurchaseRecord, SaleRecord, ServiceJob, ServiceStatus, TaskRecord,
};

use super::Record;

/// Parse a stored timestamp cell; unparseable cells read as the epoch so
/// they never match a calendar-day filter.
pub fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            value
                .trim()
                .parse::<chrono::NaiveDateTime>()
                .map(|naive| naive.and_utc())
        })
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    value.trim().parse::<NaiveDate>().ok()
}

// ---------- Inventory ----------

pub fn inventory_item(record: &Record) -> InventoryItem {
    InventoryItem {
        product_name: record.get("Product").to_string(),
        quantity: record.decimal("Quantity", Decimal::ZERO),
        last_price: record.decimal("Price", Decimal::ZERO),
        updated_at: parse_timestamp(record.get("UpdatedAt")),
    }
}

pub fn inventory_row(item: &InventoryItem) -> Vec<String> {
    vec![
        item.product_name.clone(),
        item.quantity.to_string(),
        item.last_price.to_string(),
        item.updated_at.to_rfc3339(),
    ]
}

// ---------- Purchase / Sales ----------

pub fn purchase_record(record: &Record) -> PurchaseRecord {
    PurchaseRecord {
        id: record.get("PurchaseID").to_string(),
        timestamp: parse_timestamp(record.get("Date")),
        supplier_name: record.get("Supplier").to_string(),
        product_name: record.get("Product").to_string(),
        quantity: record.decimal("Quantity", Decimal::ZERO),
        unit_price: record.decimal("PriceEach", Decimal::ZERO),
        total: record.decimal("Total", Decimal::ZERO),
        notes: record.get("Notes").to_string(),
    }
}

pub fn purchase_row(record: &PurchaseRecord) -> Vec<String> {
    vec![
        record.id.clone(),
        record.timestamp.to_rfc3339(),
        record.supplier_name.clone(),
        record.product_name.clone(),
        record.quantity.to_string(),
        record.unit_price.to_string(),
        record.total.to_string(),
        record.notes.clone(),
    ]
}

pub fn sale_record(record: &Record) -> SaleRecord {
    SaleRecord {
        id: record.get("SaleID").to_string(),
        timestamp: parse_timestamp(record.get("Date")),
        customer_name: record.get("Customer").to_string(),
        product_name: record.get("Product").to_string(),
        quantity: record.decimal("Quantity", Decimal::ZERO),
        unit_price: record.decimal("PriceEach", Decimal::ZERO),
        total: record.decimal("Total", Decimal::ZERO),
        profit: record.decimal("Profit", Decimal::ZERO),
        notes: record.get("Notes").to_string(),
    }
}

pub fn sale_row(record: &SaleRecord) -> Vec<String> {
    vec![
        record.id.clone(),
        record.timestamp.to_rfc3339(),
        record.customer_name.clone(),
        record.product_name.clone(),
        record.quantity.to_string(),
        record.unit_price.to_string(),
        record.total.to_string(),
        record.profit.to_string(),
        record.notes.clone(),
    ]
}

// ---------- CRM ----------

pub fn entity_profile(record: &Record) -> EntityProfile {
    EntityProfile {
        name: record.get("Customer").to_string(),
        phone: record.get("Phone").to_string(),
        email: record.get("Email").to_string(),
        last_visit: parse_date(record.get("LastVisit")),
        total_purchases: record.decimal("TotalPurchases", Decimal::ZERO),
        total_spent: record.decimal("TotalSpent", Decimal::ZERO),
        total_profit: record.decimal("TotalProfit", Decimal::ZERO),
        notes: record.get("Notes").to_string(),
        tags: record.get("Tags").to_string(),
    }
}

pub fn entity_profile_row(profile: &EntityProfile) -> Vec<String> {
    vec![
        profile.name.clone(),
        profile.phone.clone(),
        profile.email.clone(),
        profile
            .last_visit
            .map(|d| d.to_string())
            .unwrap_or_default(),
        profile.total_purchases.to_string(),
        profile.total_spent.to_string(),
        profile.total_profit.to_string(),
        profile.notes.clone(),
        profile.tags.clone(),
    ]
}

// ---------- Invoice ----------

pub fn invoice_record(record: &Record) -> InvoiceRecord {
    let line_items: Vec<InvoiceLineItem> =
        serde_json::from_str(record.get("ItemsJSON")).unwrap_or_default();
    InvoiceRecord {
        id: record.get("InvoiceID").to_string(),
        date: parse_timestamp(record.get("Date")),
        customer: record.get("Customer").to_string(),
        line_items,
        subtotal: record.decimal("Subtotal", Decimal::ZERO),
        tax_rate: record.decimal("TaxRate", Decimal::ZERO),
        discount: record.decimal("Discount", Decimal::ZERO),
        grand_total: record.decimal("GrandTotal", Decimal::ZERO),
        paid: record.decimal("Paid", Decimal::ZERO),
        due: record.decimal("Due", Decimal::ZERO),
    }
}

pub fn invoice_row(record: &InvoiceRecord) -> Vec<String> {
    let items_json = serde_json::to_string(&record.line_items).unwrap_or_else(|_| "[]".into());
    vec![
        record.id.clone(),
        record.date.to_rfc3339(),
        record.customer.clone(),
        items_json,
        record.subtotal.to_string(),
        record.tax_rate.to_string(),
        record.discount.to_string(),
        record.grand_total.to_string(),
        record.paid.to_string(),
        record.due.to_string(),
    ]
}

// ---------- Service history ----------

pub fn service_job(record: &Record) -> ServiceJob {
    ServiceJob {
        id: record.get("ServiceID").to_string(),
        date: parse_timestamp(record.get("Date")),
        customer: record.get("Customer").to_string(),
        device: record.get("Device").to_string(),
        problem: record.get("Problem").to_string(),
        status: ServiceStatus::parse(record.get("Status")),
        cost: record.decimal("Cost", Decimal::ZERO),
        technician: record.get("Technician").to_string(),
        notes: record.get("Notes").to_string(),
    }
}

pub fn service_job_row(job: &ServiceJob) -> Vec<String> {
    vec![
        job.id.clone(),
        job.date.to_rfc3339(),
        job.customer.clone(),
        job.device.clone(),
        job.problem.clone(),
        job.status.as_str().to_string(),
        job.cost.to_string(),
        job.technician.clone(),
        job.notes.clone(),
    ]
}

// ---------- Memory ----------

pub fn memory_entry(record: &Record) -> MemoryEntry {
    MemoryEntry {
        user_id: record.get("UserID").to_string(),
        timestamp: parse_timestamp(record.get("Timestamp")),
        role: MemoryRole::parse(record.get("Role")),
        text: record.get("Text").to_string(),
    }
}

pub fn memory_row(entry: &MemoryEntry) -> Vec<String> {
    vec![
        entry.user_id.clone(),
        entry.timestamp.to_rfc3339(),
        entry.role.as_str().to_string(),
        entry.text.clone(),
    ]
}

// ---------- Finance / Tasks ----------

pub fn finance_record(record: &Record) -> FinanceRecord {
    FinanceRecord {
        customer: record.get("Customer").to_string(),
        amount: record.decimal("Amount", Decimal::ZERO),
        entry_type: record.get("Type").to_string(),
        date: parse_date(record.get("Date")).unwrap_or(NaiveDate::MIN),
        notes: record.get("Notes").to_string(),
    }
}

pub fn task_record(record: &Record) -> TaskRecord {
    TaskRecord {
        name: record.get("TaskName").to_string(),
        assigned_to: record.get("AssignedTo").to_string(),
        status: record.get("Status").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_lenient() {
        let rfc = parse_timestamp("2024-03-01T10:15:30+00:00");
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T10:15:30+00:00");

        // Naive ISO strings (earlier writers) are treated as UTC
        let naive = parse_timestamp("2024-03-01T10:15:30");
        assert_eq!(naive, rfc);

        assert_eq!(parse_timestamp("not a date"), DateTime::UNIX_EPOCH);
    }
}
