//! Entity directory
//!
//! CRM profiles for customers and suppliers, keyed case-insensitively by
//! name, with lifetime counters that only ever increase. Contact fields are
//! updated only when a new value is provided; notes and tags are merged,
//! never clobbered. Mutations run under a per-entity lock, like the
//! inventory ledger's per-product lock.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use shared::{CustomerContact, EntityProfile};

use crate::error::AppResult;
use crate::services::normalizer::CustomerFields;
use crate::store::{rows, schema, StoreHandle, TabularStore};

// CRM column positions (1-based)
const COL_PHONE: usize = 2;
const COL_EMAIL: usize = 3;
const COL_LAST_VISIT: usize = 4;
const COL_TOTAL_PURCHASES: usize = 5;
const COL_TOTAL_SPENT: usize = 6;
const COL_TOTAL_PROFIT: usize = 7;
const COL_NOTES: usize = 8;
const COL_TAGS: usize = 9;

/// Optional contact details for an upsert; empty fields keep existing values
#[derive(Debug, Clone, Default)]
pub struct UpsertInput {
    pub phone: String,
    pub email: String,
    pub notes: String,
    pub tags: String,
}

/// Customer/supplier profile store
#[derive(Clone)]
pub struct EntityDirectory {
    store: StoreHandle,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl EntityDirectory {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let key = name.trim().to_lowercase();
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn find_profile(&self, name: &str) -> AppResult<Option<(usize, EntityProfile)>> {
        let records = self.store.read_all(schema::CRM).await?;
        Ok(records.iter().find_map(|record| {
            let profile = rows::entity_profile(record);
            profile.matches(name).then_some((record.row_index, profile))
        }))
    }

    /// Create or update a profile. Existing contact fields survive empty
    /// input; notes and tags are appended; LastVisit is stamped.
    pub async fn upsert(&self, name: &str, input: UpsertInput) -> AppResult<EntityProfile> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let today = Utc::now().date_naive();
        match self.find_profile(name).await? {
            Some((row, mut profile)) => {
                if !input.phone.is_empty() {
                    profile.phone = input.phone.clone();
                    self.store
                        .update_cell(schema::CRM, row, COL_PHONE, &input.phone)
                        .await?;
                }
                if !input.email.is_empty() {
                    profile.email = input.email.clone();
                    self.store
                        .update_cell(schema::CRM, row, COL_EMAIL, &input.email)
                        .await?;
                }
                if !input.notes.is_empty() {
                    profile.notes = format!("{} {}", profile.notes, input.notes)
                        .trim()
                        .to_string();
                    self.store
                        .update_cell(schema::CRM, row, COL_NOTES, &profile.notes)
                        .await?;
                }
                if !input.tags.is_empty() {
                    profile.tags = if profile.tags.is_empty() {
                        input.tags.clone()
                    } else {
                        format!("{},{}", profile.tags, input.tags)
                    };
                    self.store
                        .update_cell(schema::CRM, row, COL_TAGS, &profile.tags)
                        .await?;
                }
                profile.last_visit = Some(today);
                self.store
                    .update_cell(schema::CRM, row, COL_LAST_VISIT, &today.to_string())
                    .await?;
                Ok(profile)
            }
            None => {
                let mut profile = EntityProfile::new(name.trim());
                profile.phone = input.phone;
                profile.email = input.email;
                profile.notes = input.notes;
                profile.tags = input.tags;
                profile.last_visit = Some(today);
                self.store
                    .append_row(schema::CRM, rows::entity_profile_row(&profile))
                    .await?;
                Ok(profile)
            }
        }
    }

    /// Accumulate one transaction onto an entity's lifetime counters.
    /// Returns false when no profile matches; the caller decides whether to
    /// create one first.
    pub async fn record_transaction(
        &self,
        name: &str,
        amount: Decimal,
        profit: Decimal,
    ) -> AppResult<bool> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let Some((row, mut profile)) = self.find_profile(name).await? else {
            return Ok(false);
        };

        profile.total_purchases += Decimal::ONE;
        profile.total_spent += amount;
        profile.total_profit += profit;

        self.store
            .update_cell(
                schema::CRM,
                row,
                COL_TOTAL_PURCHASES,
                &profile.total_purchases.to_string(),
            )
            .await?;
        self.store
            .update_cell(
                schema::CRM,
                row,
                COL_TOTAL_SPENT,
                &profile.total_spent.to_string(),
            )
            .await?;
        self.store
            .update_cell(
                schema::CRM,
                row,
                COL_TOTAL_PROFIT,
                &profile.total_profit.to_string(),
            )
            .await?;
        Ok(true)
    }

    /// Fetch a profile by name
    pub async fn get_profile(&self, name: &str) -> AppResult<Option<EntityProfile>> {
        Ok(self.find_profile(name).await?.map(|(_, profile)| profile))
    }

    /// Append a plain contact entry to the address book
    pub async fn add_contact(&self, fields: &CustomerFields) -> AppResult<()> {
        self.store
            .append_row(
                schema::CUSTOMER,
                vec![
                    fields.name.clone(),
                    fields.email.clone(),
                    fields.phone.clone(),
                    fields.company.clone(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
    }

    /// All address book contacts
    pub async fn list_contacts(&self) -> AppResult<Vec<CustomerContact>> {
        let records = self.store.read_all(schema::CUSTOMER).await?;
        Ok(records
            .iter()
            .map(|record| CustomerContact {
                name: record.get("Name").to_string(),
                email: record.get("Email").to_string(),
                phone: record.get("Phone").to_string(),
                company: record.get("Company").to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn directory() -> EntityDirectory {
        EntityDirectory::new(Arc::new(MemoryStore::with_schema().await))
    }

    #[tokio::test]
    async fn test_upsert_merges_case_insensitively() {
        let directory = directory().await;

        directory
            .upsert(
                "Acme",
                UpsertInput {
                    phone: "123".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = directory
            .upsert(
                "acme",
                UpsertInput {
                    email: "a@b.com".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // One profile, phone not clobbered by the second upsert
        assert_eq!(profile.phone, "123");
        assert_eq!(profile.email, "a@b.com");

        let all = directory.store.read_all(schema::CRM).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_appends_notes_and_tags() {
        let directory = directory().await;
        directory
            .upsert(
                "Acme",
                UpsertInput {
                    notes: "first visit".to_string(),
                    tags: "vip".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = directory
            .upsert(
                "Acme",
                UpsertInput {
                    notes: "asked for GST bill".to_string(),
                    tags: "wholesale".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.notes, "first visit asked for GST bill");
        assert_eq!(profile.tags, "vip,wholesale");
    }

    #[tokio::test]
    async fn test_record_transaction_increments_counters() {
        let directory = directory().await;
        directory.upsert("Rahul", UpsertInput::default()).await.unwrap();

        assert!(directory
            .record_transaction("rahul", Decimal::from(100), Decimal::from(20))
            .await
            .unwrap());
        assert!(directory
            .record_transaction("RAHUL", Decimal::from(50), Decimal::from(-5))
            .await
            .unwrap());

        let profile = directory.get_profile("Rahul").await.unwrap().unwrap();
        assert_eq!(profile.total_purchases, Decimal::from(2));
        assert_eq!(profile.total_spent, Decimal::from(150));
        assert_eq!(profile.total_profit, Decimal::from(15));
    }

    #[tokio::test]
    async fn test_record_transaction_unknown_entity_is_false() {
        let directory = directory().await;
        assert!(!directory
            .record_transaction("Nobody", Decimal::from(10), Decimal::ONE)
            .await
            .unwrap());
    }
}
