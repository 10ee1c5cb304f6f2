//! Service job models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a service job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "Pending",
            ServiceStatus::InProgress => "InProgress",
            ServiceStatus::Done => "Done",
        }
    }

    /// Parse a stored status cell. Unknown values read back as Pending.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "inprogress" | "in progress" | "in_progress" => ServiceStatus::InProgress,
            "done" | "completed" => ServiceStatus::Done,
            _ => ServiceStatus::Pending,
        }
    }
}

/// A repair/service job tracked for a customer device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceJob {
    pub id: String,
    pub date: DateTime<Utc>,
    pub customer: String,
    pub device: String,
    pub problem: String,
    pub status: ServiceStatus,
    pub cost: Decimal,
    pub technician: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ServiceStatus::Pending,
            ServiceStatus::InProgress,
            ServiceStatus::Done,
        ] {
            assert_eq!(ServiceStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_reads_as_pending() {
        assert_eq!(ServiceStatus::parse("waiting on parts"), ServiceStatus::Pending);
        assert_eq!(ServiceStatus::parse(""), ServiceStatus::Pending);
    }
}
