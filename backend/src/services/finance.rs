//! Finance book and task list
//!
//! Thin append/list services over the supplemental `Finance` and `Task`
//! collections; the weekly rollup reads both.

use chrono::Utc;

use shared::{FinanceRecord, TaskRecord};

use crate::error::AppResult;
use crate::services::normalizer::{FinanceFields, TaskFields};
use crate::store::{rows, schema, StoreHandle, TabularStore};

#[derive(Clone)]
pub struct FinanceService {
    store: StoreHandle,
}

impl FinanceService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Append a finance entry; a missing date defaults to today
    pub async fn add(&self, fields: &FinanceFields) -> AppResult<()> {
        let date = if fields.date.is_empty() {
            Utc::now().date_naive().to_string()
        } else {
            fields.date.clone()
        };
        self.store
            .append_row(
                schema::FINANCE,
                vec![
                    fields.customer.clone(),
                    fields.amount.to_string(),
                    fields.entry_type.clone(),
                    date,
                    fields.notes.clone(),
                ],
            )
            .await
    }

    pub async fn list(&self) -> AppResult<Vec<FinanceRecord>> {
        let records = self.store.read_all(schema::FINANCE).await?;
        Ok(records.iter().map(rows::finance_record).collect())
    }
}

#[derive(Clone)]
pub struct TaskService {
    store: StoreHandle,
}

impl TaskService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    pub async fn add(&self, fields: &TaskFields) -> AppResult<()> {
        self.store
            .append_row(
                schema::TASK,
                vec![
                    fields.name.clone(),
                    fields.assigned_to.clone(),
                    fields.status.clone(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
    }

    pub async fn list(&self) -> AppResult<Vec<TaskRecord>> {
        let records = self.store.read_all(schema::TASK).await?;
        Ok(records.iter().map(rows::task_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_finance_add_and_list() {
        let service = FinanceService::new(Arc::new(MemoryStore::with_schema().await));
        service
            .add(&FinanceFields {
                customer: "Rahul".to_string(),
                amount: Decimal::from(5000),
                entry_type: "Income".to_string(),
                date: String::new(),
                notes: String::new(),
            })
            .await
            .unwrap();

        let records = service.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_income());
        assert_eq!(records[0].amount, Decimal::from(5000));
        // Defaulted date is today
        assert_eq!(records[0].date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn test_task_defaults_applied_by_normalizer_survive() {
        let service = TaskService::new(Arc::new(MemoryStore::with_schema().await));
        service
            .add(&TaskFields {
                name: "Call supplier".to_string(),
                assigned_to: "self".to_string(),
                status: "pending".to_string(),
            })
            .await
            .unwrap();

        let tasks = service.list().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_pending());
    }
}
