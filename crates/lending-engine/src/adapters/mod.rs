//! # Adapters
//!
//! Ledger stores and clocks. The RocksDB store lives in `lending-node`
//! behind its `rocksdb` feature.

pub mod clock;
pub mod file_store;
pub mod memory_store;

pub use clock::{ManualClock, SystemTimeSource};
pub use file_store::FileLedgerStore;
pub use memory_store::InMemoryLedgerStore;
