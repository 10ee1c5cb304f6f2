//! Reporting aggregator
//!
//! Read-only summaries derived by scanning ledger and recorder state:
//! low stock, top sellers, profit totals, today's figures and the weekly
//! rollup. Only the weekly rollup writes anything — its own generated text
//! into the `Report` collection, as an audit record.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use shared::{format_money, InventoryItem};

use crate::error::AppResult;
use crate::services::ledger::LOW_STOCK_THRESHOLD;
use crate::store::{rows, schema, StoreHandle, TabularStore};

/// Today's purchase/sale/profit totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodaySummary {
    pub purchases: Decimal,
    pub sales: Decimal,
    pub profit: Decimal,
}

/// How many products a top-sellers digest shows
const TOP_SELLING_LIMIT: usize = 3;

#[derive(Clone)]
pub struct ReportingAggregator {
    store: StoreHandle,
}

impl ReportingAggregator {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Items at or below the threshold
    pub async fn low_stock(&self, threshold: Decimal) -> AppResult<Vec<InventoryItem>> {
        let records = self.store.read_all(schema::INVENTORY).await?;
        Ok(records
            .iter()
            .map(rows::inventory_item)
            .filter(|item| item.quantity <= threshold)
            .collect())
    }

    /// Total quantity sold per product, descending. Ties keep the order in
    /// which products were first encountered in the sales ledger.
    pub async fn top_selling(&self, limit: usize) -> AppResult<Vec<(String, Decimal)>> {
        let records = self.store.read_all(schema::SALES).await?;

        let mut totals: Vec<(String, Decimal)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for record in &records {
            let sale = rows::sale_record(record);
            if sale.product_name.is_empty() {
                continue;
            }
            let key = sale.product_name.trim().to_lowercase();
            match index.get(&key) {
                Some(&i) => totals[i].1 += sale.quantity,
                None => {
                    index.insert(key, totals.len());
                    totals.push((sale.product_name.trim().to_string(), sale.quantity));
                }
            }
        }

        // Stable sort preserves encounter order among equal totals
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals.truncate(limit);
        Ok(totals)
    }

    /// Profit summed over every sale ever recorded
    pub async fn total_profit(&self) -> AppResult<Decimal> {
        let records = self.store.read_all(schema::SALES).await?;
        Ok(records
            .iter()
            .map(|record| rows::sale_record(record).profit)
            .sum())
    }

    /// Purchase/sale/profit totals for the current calendar day
    pub async fn today_summary(&self) -> AppResult<TodaySummary> {
        let today = Utc::now().date_naive();
        let mut summary = TodaySummary::default();

        for record in self.store.read_all(schema::PURCHASE).await?.iter() {
            let purchase = rows::purchase_record(record);
            if purchase.timestamp.date_naive() == today {
                summary.purchases += purchase.total;
            }
        }
        for record in self.store.read_all(schema::SALES).await?.iter() {
            let sale = rows::sale_record(record);
            if sale.timestamp.date_naive() == today {
                summary.sales += sale.total;
                summary.profit += sale.profit;
            }
        }
        Ok(summary)
    }

    /// The proactive insights digest shown for the suggestions intent
    pub async fn suggestions(&self) -> AppResult<String> {
        let mut sections: Vec<String> = Vec::new();

        let low = self
            .low_stock(Decimal::from(LOW_STOCK_THRESHOLD))
            .await?;
        if !low.is_empty() {
            let mut section = "⚠️ Low Stock Items:\n".to_string();
            for item in &low {
                section.push_str(&format!("• {} — {} pcs left\n", item.product_name, item.quantity));
            }
            sections.push(section.trim_end().to_string());
        }

        let top = self.top_selling(TOP_SELLING_LIMIT).await?;
        if !top.is_empty() {
            let mut section = "🔥 Best Selling Items:\n".to_string();
            for (product, quantity) in &top {
                section.push_str(&format!("• {}: {} sold\n", product, quantity));
            }
            sections.push(section.trim_end().to_string());
        }

        let profit = self.total_profit().await?;
        if profit > Decimal::ZERO {
            sections.push(format!("💰 Total Profit So Far: {}", format_money(profit)));
        }

        let today = self.today_summary().await?;
        if today.sales > Decimal::ZERO || today.purchases > Decimal::ZERO {
            sections.push(format!(
                "📅 Today's Summary:\n• Purchases: {}\n• Sales: {}\n• Profit Today: {}",
                format_money(today.purchases),
                format_money(today.sales),
                format_money(today.profit)
            ));
        }

        if sections.is_empty() {
            return Ok("Everything looks smooth 👍".to_string());
        }
        Ok(sections.join("\n\n"))
    }

    /// Weekly rollup: finance totals, pending tasks, low stock.
    /// Persists its own text to the Report collection before returning it.
    pub async fn weekly_report(&self) -> AppResult<String> {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for record in self.store.read_all(schema::FINANCE).await?.iter() {
            let entry = rows::finance_record(record);
            if entry.is_income() {
                total_income += entry.amount;
            } else {
                total_expense += entry.amount;
            }
        }

        let customers = self.store.read_all(schema::CUSTOMER).await?.len();

        let pending_tasks = self
            .store
            .read_all(schema::TASK)
            .await?
            .iter()
            .map(rows::task_record)
            .filter(|task| task.is_pending())
            .count();

        let low_stock = self
            .low_stock(Decimal::from(LOW_STOCK_THRESHOLD))
            .await?
            .len();

        let report = format!(
            "Weekly report ({}):\nTotal Income: {}\nTotal Expense: {}\nCustomers (count): {}\nPending tasks: {}\nLow stock items: {}",
            Utc::now().date_naive(),
            format_money(total_income),
            format_money(total_expense),
            customers,
            pending_tasks,
            low_stock
        );

        self.store
            .append_row(
                schema::REPORT,
                vec![Utc::now().to_rfc3339(), report.clone()],
            )
            .await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::{PurchaseFields, SaleFields};
    use crate::services::recorder::{IdGenerator, TransactionRecorder};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn fixture() -> (Arc<MemoryStore>, ReportingAggregator, TransactionRecorder) {
        let store = Arc::new(MemoryStore::with_schema().await);
        let reporting = ReportingAggregator::new(store.clone());
        let recorder =
            TransactionRecorder::new(store.clone(), Arc::new(IdGenerator::new()));
        (store, reporting, recorder)
    }

    fn sale(customer: &str, product: &str, quantity: i64, price: i64) -> SaleFields {
        SaleFields {
            customer: customer.to_string(),
            product: product.to_string(),
            quantity: Decimal::from(quantity),
            selling_price: Decimal::from(price),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_top_selling_orders_and_breaks_ties_by_encounter() {
        let (_store, reporting, recorder) = fixture().await;

        recorder
            .record_sale(&sale("A", "Pen", 5, 8), Decimal::from(5))
            .await
            .unwrap();
        recorder
            .record_sale(&sale("B", "Notebook", 5, 40), Decimal::from(30))
            .await
            .unwrap();
        recorder
            .record_sale(&sale("C", "Stapler", 9, 120), Decimal::from(100))
            .await
            .unwrap();

        let top = reporting.top_selling(3).await.unwrap();
        assert_eq!(top[0].0, "Stapler");
        // Pen and Notebook tie at 5: Pen was encountered first
        assert_eq!(top[1].0, "Pen");
        assert_eq!(top[2].0, "Notebook");
    }

    #[tokio::test]
    async fn test_total_profit_includes_losses() {
        let (_store, reporting, recorder) = fixture().await;

        recorder
            .record_sale(&sale("A", "Pen", 3, 8), Decimal::from(5))
            .await
            .unwrap(); // +9
        recorder
            .record_sale(&sale("B", "Pen", 2, 4), Decimal::from(5))
            .await
            .unwrap(); // -2

        assert_eq!(reporting.total_profit().await.unwrap(), Decimal::from(7));
    }

    #[tokio::test]
    async fn test_today_summary_counts_todays_records() {
        let (_store, reporting, recorder) = fixture().await;

        recorder
            .record_purchase(&PurchaseFields {
                supplier: "S".to_string(),
                product: "Pen".to_string(),
                quantity: Decimal::from(10),
                unit_price: Decimal::from(5),
                notes: String::new(),
            })
            .await
            .unwrap();
        recorder
            .record_sale(&sale("A", "Pen", 3, 8), Decimal::from(5))
            .await
            .unwrap();

        let today = reporting.today_summary().await.unwrap();
        assert_eq!(today.purchases, Decimal::from(50));
        assert_eq!(today.sales, Decimal::from(24));
        assert_eq!(today.profit, Decimal::from(9));
    }

    #[tokio::test]
    async fn test_suggestions_when_quiet() {
        let (_store, reporting, _recorder) = fixture().await;
        assert_eq!(
            reporting.suggestions().await.unwrap(),
            "Everything looks smooth 👍"
        );
    }

    #[tokio::test]
    async fn test_weekly_report_persists_audit_row() {
        let (store, reporting, _recorder) = fixture().await;

        store
            .append_row(
                schema::FINANCE,
                vec![
                    "Rahul".into(),
                    "5000".into(),
                    "Income".into(),
                    "2024-03-01".into(),
                    "".into(),
                ],
            )
            .await
            .unwrap();
        store
            .append_row(
                schema::FINANCE,
                vec![
                    "Sharma Traders".into(),
                    "2000".into(),
                    "Expense".into(),
                    "2024-03-02".into(),
                    "".into(),
                ],
            )
            .await
            .unwrap();

        let report = reporting.weekly_report().await.unwrap();
        assert!(report.contains("Total Income: ₹5000"));
        assert!(report.contains("Total Expense: ₹2000"));

        let audit = store.read_all(schema::REPORT).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].get("Text"), report);
    }
}
