//! Local persistence adapters: SQLite delivery log, JSON state file, and
//! in-memory variants for tests and demo mode.

pub mod delivery_log;
pub mod memory;
pub mod state_json;

pub use delivery_log::SqliteDeliveryLog;
pub use memory::{MemoryDeliveryLog, MemoryState};
pub use state_json::StateJson;
