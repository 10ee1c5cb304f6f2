//! Service job tracking
//!
//! Repair jobs are created as Pending and their status, cost and
//! technician are mutated as work progresses. Everything else about a job
//! is fixed at creation.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use shared::{ServiceJob, ServiceStatus};

use crate::error::AppResult;
use crate::services::normalizer::{ServiceFields, ServiceUpdateFields};
use crate::services::recorder::IdGenerator;
use crate::store::{rows, schema, StoreHandle, TabularStore};

// ServiceHistory column positions (1-based)
const COL_STATUS: usize = 6;
const COL_COST: usize = 7;
const COL_TECHNICIAN: usize = 8;

#[derive(Clone)]
pub struct ServiceJobService {
    store: StoreHandle,
    ids: Arc<IdGenerator>,
}

impl ServiceJobService {
    pub fn new(store: StoreHandle, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Open a new job with status Pending and zero cost
    pub async fn create(&self, fields: &ServiceFields) -> AppResult<ServiceJob> {
        let now = Utc::now();
        let job = ServiceJob {
            id: self.ids.next_id("JOB", now),
            date: now,
            customer: fields.customer.clone(),
            device: fields.device.clone(),
            problem: fields.problem.clone(),
            status: ServiceStatus::Pending,
            cost: Decimal::ZERO,
            technician: fields.technician.clone(),
            notes: String::new(),
        };
        self.store
            .append_row(schema::SERVICE_HISTORY, rows::service_job_row(&job))
            .await?;
        Ok(job)
    }

    /// Fetch a job by id
    pub async fn get(&self, job_id: &str) -> AppResult<Option<ServiceJob>> {
        let records = self.store.read_all(schema::SERVICE_HISTORY).await?;
        Ok(records.iter().find_map(|record| {
            let job = rows::service_job(record);
            (job.id == job_id.trim()).then_some(job)
        }))
    }

    /// Update status/cost/technician on an existing job.
    /// Returns the updated job, or None when the id is unknown.
    pub async fn update(&self, fields: &ServiceUpdateFields) -> AppResult<Option<ServiceJob>> {
        let records = self.store.read_all(schema::SERVICE_HISTORY).await?;
        let found = records.iter().find_map(|record| {
            let job = rows::service_job(record);
            (job.id == fields.service_id.trim()).then_some((record.row_index, job))
        });

        let Some((row, mut job)) = found else {
            return Ok(None);
        };

        if !fields.status.is_empty() {
            job.status = ServiceStatus::parse(&fields.status);
            self.store
                .update_cell(schema::SERVICE_HISTORY, row, COL_STATUS, job.status.as_str())
                .await?;
        }
        if let Some(cost) = fields.cost {
            job.cost = cost;
            self.store
                .update_cell(schema::SERVICE_HISTORY, row, COL_COST, &cost.to_string())
                .await?;
        }
        if !fields.technician.is_empty() {
            job.technician = fields.technician.clone();
            self.store
                .update_cell(
                    schema::SERVICE_HISTORY,
                    row,
                    COL_TECHNICIAN,
                    &fields.technician,
                )
                .await?;
        }
        Ok(Some(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn new_job(customer: &str) -> ServiceFields {
        ServiceFields {
            customer: customer.to_string(),
            device: "Laptop".to_string(),
            problem: "Does not boot".to_string(),
            technician: String::new(),
        }
    }

    async fn service() -> ServiceJobService {
        ServiceJobService::new(
            Arc::new(MemoryStore::with_schema().await),
            Arc::new(IdGenerator::new()),
        )
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let service = service().await;
        let job = service.create(&new_job("Rahul")).await.unwrap();
        assert!(job.id.starts_with("JOB-"));
        assert_eq!(job.status, ServiceStatus::Pending);
        assert_eq!(job.cost, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_progresses_job() {
        let service = service().await;
        let job = service.create(&new_job("Rahul")).await.unwrap();

        let updated = service
            .update(&ServiceUpdateFields {
                service_id: job.id.clone(),
                status: "done".to_string(),
                cost: Some(Decimal::from(1200)),
                technician: "Amit".to_string(),
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, ServiceStatus::Done);
        assert_eq!(updated.cost, Decimal::from(1200));
        assert_eq!(updated.technician, "Amit");

        // The mutation is persisted
        let fetched = service.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ServiceStatus::Done);
        assert_eq!(fetched.cost, Decimal::from(1200));
    }

    #[tokio::test]
    async fn test_update_unknown_job_is_none() {
        let service = service().await;
        let outcome = service
            .update(&ServiceUpdateFields {
                service_id: "JOB-nope".to_string(),
                status: "done".to_string(),
                cost: None,
                technician: String::new(),
            })
            .await
            .unwrap();
        assert!(outcome.is_none());
    }
}
