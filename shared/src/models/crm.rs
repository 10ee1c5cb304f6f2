//! Customer and supplier profile models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A CRM profile for a customer or supplier
///
/// The name is the case-insensitive key. Lifetime counters only ever
/// increase; contact fields are updated only when new values are provided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProfile {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub last_visit: Option<NaiveDate>,
    pub total_purchases: Decimal,
    pub total_spent: Decimal,
    pub total_profit: Decimal,
    pub notes: String,
    pub tags: String,
}

impl EntityProfile {
    /// A fresh profile with zeroed counters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: String::new(),
            email: String::new(),
            last_visit: None,
            total_purchases: Decimal::ZERO,
            total_spent: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            notes: String::new(),
            tags: String::new(),
        }
    }

    /// Case-insensitive key match
    pub fn matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// A plain address-book contact entry, distinct from the CRM aggregate
/// profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
}
