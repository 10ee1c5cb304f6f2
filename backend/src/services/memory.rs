//! Conversation memory
//!
//! Append-only per-user turn history in the `Memory` collection, read back
//! as a bounded tail to give the classifier short-term context.

use chrono::Utc;

use shared::{MemoryEntry, MemoryRole};

use crate::error::AppResult;
use crate::store::{rows, schema, StoreHandle, TabularStore};

/// How many recent turns are fed back to the classifier
pub const MEMORY_WINDOW: usize = 6;

#[derive(Clone)]
pub struct ConversationMemory {
    store: StoreHandle,
}

impl ConversationMemory {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Remember one turn for a user
    pub async fn append(&self, user_id: &str, role: MemoryRole, text: &str) -> AppResult<()> {
        let entry = MemoryEntry {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            role,
            text: text.to_string(),
        };
        self.store
            .append_row(schema::MEMORY, rows::memory_row(&entry))
            .await
    }

    /// The last `limit` turns for a user, oldest first
    pub async fn recent(&self, user_id: &str, limit: usize) -> AppResult<Vec<MemoryEntry>> {
        let records = self.store.read_all(schema::MEMORY).await?;
        let mut entries: Vec<MemoryEntry> = records
            .iter()
            .map(rows::memory_entry)
            .filter(|entry| entry.user_id == user_id)
            .collect();
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Ok(entries)
    }

    /// Render entries as classifier context
    pub fn as_context(entries: &[MemoryEntry]) -> String {
        entries
            .iter()
            .map(|entry| format!("{}: {}", entry.role.as_str(), entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_recent_is_bounded_and_per_user() {
        let memory = ConversationMemory::new(Arc::new(MemoryStore::with_schema().await));

        for i in 0..5 {
            memory
                .append("42", MemoryRole::User, &format!("message {}", i))
                .await
                .unwrap();
        }
        memory.append("99", MemoryRole::User, "other user").await.unwrap();

        let recent = memory.recent("42", 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].text, "message 2");
        assert_eq!(recent[2].text, "message 4");
    }

    #[tokio::test]
    async fn test_context_rendering() {
        let memory = ConversationMemory::new(Arc::new(MemoryStore::with_schema().await));
        memory.append("42", MemoryRole::User, "hello").await.unwrap();
        memory.append("42", MemoryRole::Assistant, "hi!").await.unwrap();

        let entries = memory.recent("42", MEMORY_WINDOW).await.unwrap();
        assert_eq!(
            ConversationMemory::as_context(&entries),
            "user: hello\nassistant: hi!"
        );
    }
}
