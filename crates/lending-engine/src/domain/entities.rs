//! # Ledger Entities
//!
//! `LoanRecord` is what the ledger store persists. The `*View` and snapshot
//! types are read models handed to callers.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Amount, BasisPoints, LoanState, Timestamp};

/// One borrower's loan, keyed by borrower in the `loans` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub borrower: AccountId,
    pub lender: AccountId,
    pub requested_amount: Amount,
    pub collateral_amount: Amount,
    /// Fixed at request time.
    pub repay_amount: Amount,
    pub interest_rate_bps: BasisPoints,
    pub state: LoanState,
    pub created_at: Timestamp,
    pub funded_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    /// Principal not covered by seized collateral. Zero unless Defaulted.
    pub shortfall: Amount,
}

impl LoanRecord {
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Interest portion of the repay amount.
    pub fn interest(&self) -> Amount {
        self.repay_amount.saturating_sub(self.requested_amount)
    }

    /// Collateral the engine still holds for this loan.
    pub fn escrowed_collateral(&self) -> Amount {
        if self.is_active() {
            self.collateral_amount
        } else {
            0
        }
    }

    /// Principal encumbering the lender's contribution.
    pub fn committed_principal(&self) -> Amount {
        if self.state == LoanState::Funded {
            self.requested_amount
        } else {
            0
        }
    }
}

/// Caller-facing view of a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanView {
    pub borrower: AccountId,
    pub lender: AccountId,
    pub requested_amount: Amount,
    pub collateral_amount: Amount,
    pub repay_amount: Amount,
    pub interest_rate_bps: BasisPoints,
    pub state: LoanState,
    pub created_at: Timestamp,
    pub funded_at: Option<Timestamp>,
    /// Set while Funded: liquidation becomes possible strictly after this.
    pub due_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    /// Set once Defaulted.
    pub shortfall: Option<Amount>,
}

impl LoanView {
    pub fn from_record(record: &LoanRecord, due_at: Option<Timestamp>) -> Self {
        Self {
            borrower: record.borrower,
            lender: record.lender,
            requested_amount: record.requested_amount,
            collateral_amount: record.collateral_amount,
            repay_amount: record.repay_amount,
            interest_rate_bps: record.interest_rate_bps,
            state: record.state,
            created_at: record.created_at,
            funded_at: record.funded_at,
            due_at,
            closed_at: record.closed_at,
            shortfall: (record.state == LoanState::Defaulted).then_some(record.shortfall),
        }
    }
}

/// Pool balances at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Sum of lender contributions.
    pub tracked_balance: Amount,
    /// Uncommitted funds: tracked minus committed.
    pub actual_balance: Amount,
    /// Principal out on Funded loans.
    pub committed: Amount,
    /// Collateral held for Requested and Funded loans.
    pub escrowed_collateral: Amount,
    /// Everything the engine physically holds: actual plus escrowed.
    pub custody_balance: Amount,
}

/// A lender's position in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderView {
    pub lender: AccountId,
    pub contribution: Amount,
    pub reserved: Amount,
    /// Contribution not reserved by Funded loans.
    pub available: Amount,
}

/// Result of a full recomputation of the ledger aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub tracked_balance: Amount,
    pub committed: Amount,
    pub escrowed_collateral: Amount,
    pub lenders: usize,
    pub loans: usize,
    pub active_loans: usize,
    pub funded_loans: usize,
    pub checked_at: Timestamp,
}
