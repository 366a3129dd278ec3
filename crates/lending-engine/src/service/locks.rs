//! Per-borrower critical sections.

use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::AccountId;
use std::sync::Arc;

/// One mutex per borrower, created on first use.
///
/// Entries are never removed; the table grows with the number of distinct
/// borrowers, the same as the loan table.
#[derive(Debug, Default)]
pub struct BorrowerLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl BorrowerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the borrower's mutex. Lock it before the pool lock.
    pub fn handle(&self, borrower: AccountId) -> Arc<Mutex<()>> {
        self.locks.entry(borrower).or_default().clone()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
