//! Finance and task models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A simple finance ledger entry (income or expense)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceRecord {
    pub customer: String,
    pub amount: Decimal,
    pub entry_type: String,
    pub date: NaiveDate,
    pub notes: String,
}

impl FinanceRecord {
    /// Weekly rollups treat anything that is not income as an expense
    pub fn is_income(&self) -> bool {
        self.entry_type.trim().to_lowercase() == "income"
    }
}

/// A to-do item for the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub assigned_to: String,
    pub status: String,
}

impl TaskRecord {
    pub fn is_pending(&self) -> bool {
        self.status.trim().to_lowercase() != "done"
    }
}
