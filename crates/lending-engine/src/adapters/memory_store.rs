use crate::domain::errors::StoreError;
use crate::ports::outbound::{LedgerBatch, LedgerSnapshot, LedgerStore};
use parking_lot::RwLock;

/// Volatile ledger store for tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerSnapshot>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing tables.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, batch: &LedgerBatch) -> Result<(), StoreError> {
        self.state.write().apply(batch);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
