//! In-memory tabular store
//!
//! A drop-in store double used by the test suites and local development.
//! Behaves like the remote service: header row at row 1, data from row 2,
//! cells are strings.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

use super::{schema, Record, TabularStore, FIRST_DATA_ROW};

#[derive(Debug, Default)]
struct Collection {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// In-memory store keyed by collection name
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with every known collection pre-created, as `main` would
    /// leave the remote store after startup
    pub async fn with_schema() -> Self {
        let store = Self::new();
        for (collection, header) in schema::ALL {
            // Infallible for the in-memory implementation
            let _ = store.create_collection(collection, header).await;
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Collection>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn append_row(&self, collection: &str, row: Vec<String>) -> AppResult<()> {
        let mut guard = self.lock();
        let entry = guard
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("unknown collection '{}'", collection)))?;
        entry.rows.push(row);
        Ok(())
    }

    async fn read_all(&self, collection: &str) -> AppResult<Vec<Record>> {
        let guard = self.lock();
        let entry = guard
            .get(collection)
            .ok_or_else(|| AppError::Store(format!("unknown collection '{}'", collection)))?;

        let records = entry
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let fields = entry
                    .header
                    .iter()
                    .enumerate()
                    .map(|(col, name)| {
                        (name.clone(), row.get(col).cloned().unwrap_or_default())
                    })
                    .collect();
                Record::new(i + FIRST_DATA_ROW, fields)
            })
            .collect();
        Ok(records)
    }

    async fn update_cell(
        &self,
        collection: &str,
        row: usize,
        column: usize,
        value: &str,
    ) -> AppResult<()> {
        let mut guard = self.lock();
        let entry = guard
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("unknown collection '{}'", collection)))?;

        if row < FIRST_DATA_ROW || column == 0 {
            return Err(AppError::Store(format!(
                "cell ({}, {}) is out of range",
                row, column
            )));
        }
        let data_index = row - FIRST_DATA_ROW;
        let cells = entry
            .rows
            .get_mut(data_index)
            .ok_or_else(|| AppError::Store(format!("row {} does not exist", row)))?;
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
        Ok(())
    }

    async fn create_collection(&self, collection: &str, header: &[&str]) -> AppResult<()> {
        let mut guard = self.lock();
        guard.entry(collection.to_string()).or_insert_with(|| Collection {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        });
        Ok(())
    }
}
