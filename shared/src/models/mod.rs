//! Domain models for the Vyapar Assistant

mod crm;
mod finance;
mod inventory;
mod invoice;
mod memory;
mod service_job;
mod transaction;

pub use crm::*;
pub use finance::*;
pub use inventory::*;
pub use invoice::*;
pub use memory::*;
pub use service_job::*;
pub use transaction::*;
