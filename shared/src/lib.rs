//! Shared types and models for the Vyapar Assistant
//!
//! This crate contains the domain model shared between the backend services
//! and integration tests: inventory, purchase/sale records, CRM profiles,
//! invoices, service jobs and conversation memory.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
