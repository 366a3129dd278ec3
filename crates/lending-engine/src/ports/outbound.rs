//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the engine is constructed with.

use crate::domain::entities::LoanRecord;
use crate::domain::errors::{EngineError, StoreError};
use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Amount, Timestamp};
use std::collections::BTreeMap;

/// Full contents of the ledger: the two persisted tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// `contributions(lender -> amount)`
    pub contributions: BTreeMap<AccountId, Amount>,
    /// `loans(borrower -> LoanRecord)`
    pub loans: BTreeMap<AccountId, LoanRecord>,
}

impl LedgerSnapshot {
    pub fn apply(&mut self, batch: &LedgerBatch) {
        for (lender, amount) in &batch.contributions {
            self.contributions.insert(*lender, *amount);
        }
        for loan in &batch.loans {
            self.loans.insert(loan.borrower, loan.clone());
        }
    }
}

/// Upserts produced by one engine call. Rows are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerBatch {
    pub contributions: Vec<(AccountId, Amount)>,
    pub loans: Vec<LoanRecord>,
}

impl LedgerBatch {
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty() && self.loans.is_empty()
    }
}

/// Durable ledger storage.
///
/// `commit` must be all-or-nothing: after an `Err`, a later `load` returns the
/// state from before the batch.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<LedgerSnapshot, StoreError>;

    fn commit(&self, batch: &LedgerBatch) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Abstract interface for the current time.
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Hook for observing call outcomes, e.g. to feed metrics.
pub trait EngineObserver: Send + Sync {
    /// A mutating call (or audit) succeeded.
    fn completed(&self, _operation: &'static str) {}

    /// A call returned `error`. Guard rejections, storage failures and faults all land here.
    fn rejected(&self, operation: &'static str, error: &EngineError);
}
