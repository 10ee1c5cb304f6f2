//! Field normalizer for classifier payloads
//!
//! The classifier's `data` payload is loosely typed: keys arrive in any of
//! several spellings and numbers arrive as numbers, numeric strings or
//! garbage. Each intent gets one canonical field struct here, built by
//! consulting an alias table once and coercing with safe defaults —
//! quantity falls back to 1, prices to 0, strings to empty. Nothing in this
//! module can fail.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use shared::InvoiceLineItem;

const PRODUCT_KEYS: &[&str] = &["product", "Product", "product_name", "item", "name"];
const QUANTITY_KEYS: &[&str] = &["quantity", "Quantity", "qty", "count", "amount"];
const PRICE_KEYS: &[&str] = &[
    "price",
    "Price",
    "price_each",
    "purchase_price",
    "rate",
    "cost",
];
const SELLING_PRICE_KEYS: &[&str] = &["selling_price", "price", "Price", "rate"];
const SUPPLIER_KEYS: &[&str] = &["supplier", "Supplier", "vendor"];
const CUSTOMER_KEYS: &[&str] = &["customer", "Customer", "name", "Name"];
const NOTES_KEYS: &[&str] = &["notes", "Notes"];
const PHONE_KEYS: &[&str] = &["phone", "Phone"];
const EMAIL_KEYS: &[&str] = &["email", "Email"];
const COMPANY_KEYS: &[&str] = &["company", "Company"];
const TAGS_KEYS: &[&str] = &["tags", "Tags"];
const DEVICE_KEYS: &[&str] = &["device", "Device"];
const PROBLEM_KEYS: &[&str] = &["problem", "Problem", "issue"];
const TECHNICIAN_KEYS: &[&str] = &["technician", "Technician", "tech"];
const STATUS_KEYS: &[&str] = &["status", "Status"];
const SERVICE_ID_KEYS: &[&str] = &["service_id", "ServiceID", "job_id", "id"];
const AMOUNT_KEYS: &[&str] = &["amount", "Amount"];
const TYPE_KEYS: &[&str] = &["type", "Type"];
const DATE_KEYS: &[&str] = &["date", "Date"];
const TASK_KEYS: &[&str] = &["task_name", "Task Name", "task", "TaskName", "name"];
const ASSIGNED_TO_KEYS: &[&str] = &["assigned_to", "Assigned To", "assignee"];
const TAX_RATE_KEYS: &[&str] = &["tax_rate", "TaxRate", "tax"];
const DISCOUNT_KEYS: &[&str] = &["discount", "Discount"];
const PAID_KEYS: &[&str] = &["paid", "Paid"];

pub const DEFAULT_SUPPLIER: &str = "Unknown Supplier";
pub const DEFAULT_CUSTOMER: &str = "Walk-in Customer";

/// First value present under any alias
fn lookup<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = data.as_object()?;
    keys.iter()
        .find_map(|key| object.get(*key))
        .filter(|v| !v.is_null())
}

/// A string field: missing values become the empty string
pub fn string_field(data: &Value, keys: &[&str]) -> String {
    match lookup(data, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// A numeric field: numbers and numeric strings coerce, everything else
/// falls back to the supplied default
pub fn decimal_field(data: &Value, keys: &[&str], default: Decimal) -> Decimal {
    lookup(data, keys)
        .and_then(coerce_decimal)
        .unwrap_or(default)
}

fn coerce_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

// ---------- Per-intent field structs ----------

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseFields {
    pub supplier: String,
    pub product: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleFields {
    pub customer: String,
    pub product: String,
    pub quantity: Decimal,
    pub selling_price: Decimal,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockFields {
    pub product: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct MixedFields {
    pub purchases: Vec<PurchaseFields>,
    pub sales: Vec<SaleFields>,
}

#[derive(Debug, Clone)]
pub struct CustomerFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
    pub notes: String,
    pub tags: String,
}

#[derive(Debug, Clone)]
pub struct InvoiceFields {
    pub customer: String,
    pub items: Vec<InvoiceLineItem>,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub paid: Decimal,
}

#[derive(Debug, Clone)]
pub struct ServiceFields {
    pub customer: String,
    pub device: String,
    pub problem: String,
    pub technician: String,
}

#[derive(Debug, Clone)]
pub struct ServiceUpdateFields {
    pub service_id: String,
    pub status: String,
    pub cost: Option<Decimal>,
    pub technician: String,
}

#[derive(Debug, Clone)]
pub struct FinanceFields {
    pub customer: String,
    pub amount: Decimal,
    pub entry_type: String,
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct TaskFields {
    pub name: String,
    pub assigned_to: String,
    pub status: String,
}

// ---------- Normalization entry points ----------

pub fn purchase_fields(data: &Value) -> PurchaseFields {
    let supplier = string_field(data, SUPPLIER_KEYS);
    PurchaseFields {
        supplier: if supplier.is_empty() {
            DEFAULT_SUPPLIER.to_string()
        } else {
            supplier
        },
        product: string_field(data, PRODUCT_KEYS),
        quantity: decimal_field(data, QUANTITY_KEYS, Decimal::ONE),
        unit_price: decimal_field(data, PRICE_KEYS, Decimal::ZERO),
        notes: string_field(data, NOTES_KEYS),
    }
}

pub fn sale_fields(data: &Value) -> SaleFields {
    let customer = string_field(data, CUSTOMER_KEYS);
    SaleFields {
        customer: if customer.is_empty() {
            DEFAULT_CUSTOMER.to_string()
        } else {
            customer
        },
        product: string_field(data, PRODUCT_KEYS),
        quantity: decimal_field(data, QUANTITY_KEYS, Decimal::ONE),
        selling_price: decimal_field(data, SELLING_PRICE_KEYS, Decimal::ZERO),
        notes: string_field(data, NOTES_KEYS),
    }
}

pub fn stock_fields(data: &Value) -> StockFields {
    StockFields {
        product: string_field(data, PRODUCT_KEYS),
        quantity: decimal_field(data, QUANTITY_KEYS, Decimal::ONE),
        price: decimal_field(data, PRICE_KEYS, Decimal::ZERO),
    }
}

/// Price only when the payload actually carried a usable one. Used where an
/// absent price must not clobber a stored last price.
pub fn optional_price(data: &Value) -> Option<Decimal> {
    lookup(data, PRICE_KEYS).and_then(coerce_decimal)
}

pub fn mixed_fields(data: &Value) -> MixedFields {
    let purchases = data
        .get("purchases")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(purchase_fields).collect())
        .unwrap_or_default();
    let sales = data
        .get("sales")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(sale_fields).collect())
        .unwrap_or_default();
    MixedFields { purchases, sales }
}

pub fn customer_fields(data: &Value) -> CustomerFields {
    CustomerFields {
        name: string_field(data, CUSTOMER_KEYS),
        phone: string_field(data, PHONE_KEYS),
        email: string_field(data, EMAIL_KEYS),
        company: string_field(data, COMPANY_KEYS),
        notes: string_field(data, NOTES_KEYS),
        tags: string_field(data, TAGS_KEYS),
    }
}

pub fn invoice_fields(data: &Value) -> InvoiceFields {
    let items = data
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|item| {
                    let product = string_field(item, PRODUCT_KEYS);
                    let quantity = decimal_field(item, QUANTITY_KEYS, Decimal::ONE);
                    let price = decimal_field(item, PRICE_KEYS, Decimal::ZERO);
                    InvoiceLineItem {
                        product: if product.is_empty() {
                            "Item".to_string()
                        } else {
                            product
                        },
                        quantity,
                        price,
                        total: quantity * price,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let customer = string_field(data, CUSTOMER_KEYS);
    InvoiceFields {
        customer: if customer.is_empty() {
            DEFAULT_CUSTOMER.to_string()
        } else {
            customer
        },
        items,
        tax_rate: decimal_field(data, TAX_RATE_KEYS, Decimal::ZERO),
        discount: decimal_field(data, DISCOUNT_KEYS, Decimal::ZERO),
        paid: decimal_field(data, PAID_KEYS, Decimal::ZERO),
    }
}

pub fn service_fields(data: &Value) -> ServiceFields {
    ServiceFields {
        customer: string_field(data, CUSTOMER_KEYS),
        device: string_field(data, DEVICE_KEYS),
        problem: string_field(data, PROBLEM_KEYS),
        technician: string_field(data, TECHNICIAN_KEYS),
    }
}

pub fn service_update_fields(data: &Value) -> ServiceUpdateFields {
    let cost = lookup(data, &["cost", "Cost"]).and_then(coerce_decimal);
    ServiceUpdateFields {
        service_id: string_field(data, SERVICE_ID_KEYS),
        status: string_field(data, STATUS_KEYS),
        cost,
        technician: string_field(data, TECHNICIAN_KEYS),
    }
}

pub fn finance_fields(data: &Value) -> FinanceFields {
    FinanceFields {
        customer: string_field(data, CUSTOMER_KEYS),
        amount: decimal_field(data, AMOUNT_KEYS, Decimal::ZERO),
        entry_type: string_field(data, TYPE_KEYS),
        date: string_field(data, DATE_KEYS),
        notes: string_field(data, NOTES_KEYS),
    }
}

pub fn task_fields(data: &Value) -> TaskFields {
    let assigned_to = string_field(data, ASSIGNED_TO_KEYS);
    let status = string_field(data, STATUS_KEYS);
    TaskFields {
        name: string_field(data, TASK_KEYS),
        assigned_to: if assigned_to.is_empty() {
            "self".to_string()
        } else {
            assigned_to
        },
        status: if status.is_empty() {
            "pending".to_string()
        } else {
            status
        },
    }
}

pub fn service_id_field(data: &Value) -> String {
    string_field(data, SERVICE_ID_KEYS)
}

pub fn customer_name_field(data: &Value) -> String {
    string_field(data, CUSTOMER_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stock_fields_defaults() {
        // Only a product name: quantity defaults to 1, price to 0
        let fields = stock_fields(&json!({ "Product": "X" }));
        assert_eq!(fields.product, "X");
        assert_eq!(fields.quantity, Decimal::ONE);
        assert_eq!(fields.price, Decimal::ZERO);
    }

    #[test]
    fn test_aliases_resolve_to_same_field() {
        for payload in [
            json!({ "product": "Pen", "quantity": 10, "price_each": 5 }),
            json!({ "Product": "Pen", "qty": "10", "rate": "5" }),
            json!({ "item": "Pen", "count": 10, "cost": 5 }),
        ] {
            let fields = purchase_fields(&payload);
            assert_eq!(fields.product, "Pen");
            assert_eq!(fields.quantity, Decimal::from(10));
            assert_eq!(fields.unit_price, Decimal::from(5));
        }
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let fields = purchase_fields(&json!({
            "product": "Pen",
            "quantity": "a few",
            "price_each": {"weird": true}
        }));
        assert_eq!(fields.quantity, Decimal::ONE);
        assert_eq!(fields.unit_price, Decimal::ZERO);
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let fields = sale_fields(&json!({
            "customer": "Rahul",
            "product": "Pen",
            "quantity": "3",
            "selling_price": "8.50"
        }));
        assert_eq!(fields.quantity, Decimal::from(3));
        assert_eq!(fields.selling_price, Decimal::new(850, 2));
    }

    #[test]
    fn test_counterparty_defaults() {
        let purchase = purchase_fields(&json!({ "product": "Pen" }));
        assert_eq!(purchase.supplier, DEFAULT_SUPPLIER);

        let sale = sale_fields(&json!({ "product": "Pen" }));
        assert_eq!(sale.customer, DEFAULT_CUSTOMER);
    }

    #[test]
    fn test_mixed_fields() {
        let fields = mixed_fields(&json!({
            "purchases": [{ "product": "Pen", "quantity": 10, "price_each": 5 }],
            "sales": [{ "product": "Pen", "quantity": 3, "selling_price": 8 }]
        }));
        assert_eq!(fields.purchases.len(), 1);
        assert_eq!(fields.sales.len(), 1);
        assert_eq!(fields.sales[0].quantity, Decimal::from(3));
    }

    #[test]
    fn test_mixed_fields_tolerates_missing_arrays() {
        let fields = mixed_fields(&json!({ "purchases": [] }));
        assert!(fields.purchases.is_empty());
        assert!(fields.sales.is_empty());

        let fields = mixed_fields(&json!("not an object"));
        assert!(fields.purchases.is_empty());
    }

    #[test]
    fn test_invoice_items_get_line_totals() {
        let fields = invoice_fields(&json!({
            "customer": "Acme",
            "items": [
                { "product": "Laptop", "quantity": 2, "price": 45000 },
                { "name": "Mouse" }
            ],
            "tax_rate": 18,
            "paid": "10000"
        }));
        assert_eq!(fields.items.len(), 2);
        assert_eq!(fields.items[0].total, Decimal::from(90000));
        // Missing quantity/price: defaults 1 and 0
        assert_eq!(fields.items[1].product, "Mouse");
        assert_eq!(fields.items[1].total, Decimal::ZERO);
        assert_eq!(fields.tax_rate, Decimal::from(18));
        assert_eq!(fields.paid, Decimal::from(10000));
    }

    #[test]
    fn test_optional_price_is_none_when_absent() {
        assert_eq!(optional_price(&json!({ "product": "Pen", "quantity": 4 })), None);
        assert_eq!(
            optional_price(&json!({ "product": "Pen", "price": "6" })),
            Some(Decimal::from(6))
        );
        assert_eq!(optional_price(&json!({ "price": "cheap" })), None);
    }

    #[test]
    fn test_non_object_payload_yields_defaults() {
        let fields = stock_fields(&Value::Null);
        assert_eq!(fields.product, "");
        assert_eq!(fields.quantity, Decimal::ONE);
        assert_eq!(fields.price, Decimal::ZERO);
    }
}
