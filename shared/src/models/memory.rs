//! Conversation memory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a remembered conversation turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoryRole {
    User,
    Assistant,
}

impl MemoryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryRole::User => "user",
            MemoryRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "assistant" => MemoryRole::Assistant,
            _ => MemoryRole::User,
        }
    }
}

/// One remembered conversation turn for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub role: MemoryRole,
    pub text: String,
}
