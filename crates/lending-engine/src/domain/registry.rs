//! # Loan Registry & State Machine
//!
//! One record per borrower. A borrower may open a new loan only once the
//! previous one is terminal; the new record then replaces the old one.
//!
//! Transition helpers mutate a *copy* of the record. The engine persists the
//! copy and only then writes it back with [`LoanRegistry::insert`].

use crate::domain::entities::LoanRecord;
use crate::domain::errors::EngineError;
use crate::domain::interest;
use dashmap::DashMap;
use shared_types::{AccountId, Amount, BasisPoints, LoanState, Timestamp};

/// Terms of a new loan request.
#[derive(Debug, Clone, Copy)]
pub struct LoanTerms {
    pub borrower: AccountId,
    pub lender: AccountId,
    pub requested_amount: Amount,
    pub collateral_amount: Amount,
    pub interest_rate_bps: BasisPoints,
    pub min_collateral_ratio_bps: BasisPoints,
}

impl LoanTerms {
    /// Check the request-local guards and build the record in Requested.
    ///
    /// Pool-level and registry-level guards (duplicate loan, pool funds) are
    /// the caller's job.
    pub fn open(self, now: Timestamp) -> Result<LoanRecord, EngineError> {
        if self.requested_amount == 0 {
            return Err(EngineError::invalid_amount("requested amount must be greater than zero"));
        }
        if self.collateral_amount == 0 {
            return Err(EngineError::invalid_amount("collateral must be greater than zero"));
        }
        if self.borrower == self.lender {
            return Err(EngineError::SelfDealing {
                account: self.borrower,
            });
        }
        let repay_amount = interest::repay_amount(self.requested_amount, self.interest_rate_bps)
            .ok_or_else(|| EngineError::invalid_amount("repay amount overflows"))?;
        Ok(LoanRecord {
            borrower: self.borrower,
            lender: self.lender,
            requested_amount: self.requested_amount,
            collateral_amount: self.collateral_amount,
            repay_amount,
            interest_rate_bps: self.interest_rate_bps,
            state: LoanState::Requested,
            created_at: now,
            funded_at: None,
            closed_at: None,
            shortfall: 0,
        })
    }

    /// Collateral-ratio guard.
    pub fn check_collateral(&self) -> Result<(), EngineError> {
        let under = interest::is_under_collateralized(
            self.requested_amount,
            self.collateral_amount,
            self.min_collateral_ratio_bps,
        )
        .ok_or_else(|| EngineError::invalid_amount("requested amount overflows ratio check"))?;
        if under {
            let minimum =
                interest::minimum_collateral(self.requested_amount, self.min_collateral_ratio_bps)
                    .unwrap_or(Amount::MAX);
            return Err(EngineError::UnderCollateralized {
                requested: self.requested_amount,
                collateral: self.collateral_amount,
                minimum,
            });
        }
        Ok(())
    }
}

impl LoanRecord {
    /// Fail with `WrongState` unless the loan is in `expected`.
    pub fn expect_state(&self, expected: LoanState) -> Result<(), EngineError> {
        if self.state != expected {
            return Err(EngineError::WrongState {
                borrower: self.borrower,
                state: self.state,
                expected,
            });
        }
        Ok(())
    }

    /// Fail with `WrongLender` unless `caller` is the designated lender.
    pub fn expect_lender(&self, caller: &AccountId) -> Result<(), EngineError> {
        if self.lender != *caller {
            return Err(EngineError::WrongLender {
                borrower: self.borrower,
                expected: self.lender,
                caller: *caller,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: LoanState) -> Result<(), EngineError> {
        if !self.state.can_transition_to(next) {
            return Err(EngineError::WrongState {
                borrower: self.borrower,
                state: self.state,
                expected: match next {
                    LoanState::Funded | LoanState::Cancelled => LoanState::Requested,
                    _ => LoanState::Funded,
                },
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn mark_funded(&mut self, now: Timestamp) -> Result<(), EngineError> {
        self.transition(LoanState::Funded)?;
        self.funded_at = Some(now);
        Ok(())
    }

    pub fn mark_repaid(&mut self, now: Timestamp) -> Result<(), EngineError> {
        self.transition(LoanState::Repaid)?;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn mark_cancelled(&mut self, now: Timestamp) -> Result<(), EngineError> {
        self.transition(LoanState::Cancelled)?;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn mark_defaulted(&mut self, now: Timestamp) -> Result<(), EngineError> {
        self.transition(LoanState::Defaulted)?;
        self.shortfall = self.requested_amount.saturating_sub(self.collateral_amount);
        self.closed_at = Some(now);
        Ok(())
    }
}

/// Borrower-keyed loan table.
#[derive(Debug, Default)]
pub struct LoanRegistry {
    loans: DashMap<AccountId, LoanRecord>,
}

impl LoanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = LoanRecord>) -> Self {
        let loans = DashMap::new();
        for record in records {
            loans.insert(record.borrower, record);
        }
        Self { loans }
    }

    /// Cloned so no shard guard outlives the call.
    pub fn get(&self, borrower: &AccountId) -> Option<LoanRecord> {
        self.loans.get(borrower).map(|entry| entry.value().clone())
    }

    /// The borrower's current loan if it is still open.
    pub fn active(&self, borrower: &AccountId) -> Option<LoanRecord> {
        self.get(borrower).filter(LoanRecord::is_active)
    }

    pub fn insert(&self, record: LoanRecord) {
        self.loans.insert(record.borrower, record);
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// Records matching `pred`, ordered by borrower.
    pub fn select(&self, pred: impl Fn(&LoanRecord) -> bool) -> Vec<LoanRecord> {
        let mut out: Vec<LoanRecord> = self
            .loans
            .iter()
            .filter(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by_key(|r| r.borrower);
        out
    }

    pub fn all(&self) -> Vec<LoanRecord> {
        self.select(|_| true)
    }
}
