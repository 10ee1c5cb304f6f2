//! Business logic services for the Vyapar Assistant

pub mod directory;
pub mod finance;
pub mod invoice;
pub mod jobs;
pub mod ledger;
pub mod memory;
pub mod normalizer;
pub mod orchestrator;
pub mod recorder;
pub mod reporting;

pub use directory::EntityDirectory;
pub use finance::{FinanceService, TaskService};
pub use invoice::InvoiceService;
pub use jobs::ServiceJobService;
pub use ledger::InventoryLedger;
pub use memory::ConversationMemory;
pub use orchestrator::{AssistantReply, OutcomeLine, TransactionOrchestrator};
pub use recorder::{IdGenerator, TransactionRecorder};
pub use reporting::ReportingAggregator;
