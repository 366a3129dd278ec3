//! # Pool Accounting
//!
//! Tracks lender contributions and the aggregates derived from them.
//!
//! Mutations are staged on a [`PoolTxn`] overlay that borrows the account
//! read-only. The overlay either fails on a guard (nothing changed) or
//! produces [`PoolChanges`], which the engine persists first and then
//! applies with [`PoolAccount::apply`].
//!
//! ```text
//! contribution[l] = everything lender l has a claim on
//! reserved[l]     = principal of l's Funded loans   (reserved[l] <= contribution[l])
//! tracked         = Σ contribution
//! committed       = Σ reserved
//! available       = tracked - committed
//! ```

use crate::domain::entities::{LenderView, LoanRecord, PoolSnapshot};
use crate::domain::errors::EngineError;
use shared_types::{AccountId, Amount};
use std::collections::BTreeMap;

/// In-memory pool state. Guarded by the engine's pool lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolAccount {
    contributions: BTreeMap<AccountId, Amount>,
    reserved: BTreeMap<AccountId, Amount>,
    total_pool: Amount,
    committed: Amount,
    escrowed: Amount,
}

impl PoolAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild derived state from the two persisted tables.
    pub fn rebuild<'a>(
        contributions: &BTreeMap<AccountId, Amount>,
        loans: impl IntoIterator<Item = &'a LoanRecord>,
    ) -> Result<Self, EngineError> {
        let mut pool = PoolAccount {
            contributions: contributions.clone(),
            ..Default::default()
        };
        for amount in contributions.values() {
            pool.total_pool = pool
                .total_pool
                .checked_add(*amount)
                .ok_or_else(|| EngineError::corrupted("contribution sum overflows"))?;
        }
        for loan in loans {
            let principal = loan.committed_principal();
            if principal > 0 {
                let slot = pool.reserved.entry(loan.lender).or_insert(0);
                *slot = slot
                    .checked_add(principal)
                    .ok_or_else(|| EngineError::corrupted("reserved sum overflows"))?;
                pool.committed = pool
                    .committed
                    .checked_add(principal)
                    .ok_or_else(|| EngineError::corrupted("committed sum overflows"))?;
            }
            pool.escrowed = pool
                .escrowed
                .checked_add(loan.escrowed_collateral())
                .ok_or_else(|| EngineError::corrupted("escrow sum overflows"))?;
        }
        Ok(pool)
    }

    pub fn begin(&self) -> PoolTxn<'_> {
        PoolTxn {
            base: self,
            contributions: BTreeMap::new(),
            reserved: BTreeMap::new(),
            total_pool: self.total_pool,
            committed: self.committed,
            escrowed: self.escrowed,
        }
    }

    pub fn apply(&mut self, changes: PoolChanges) {
        self.contributions.extend(changes.contributions);
        for (lender, amount) in changes.reserved {
            if amount == 0 {
                self.reserved.remove(&lender);
            } else {
                self.reserved.insert(lender, amount);
            }
        }
        self.total_pool = changes.total_pool;
        self.committed = changes.committed;
        self.escrowed = changes.escrowed;
    }

    pub fn contribution(&self, lender: &AccountId) -> Amount {
        self.contributions.get(lender).copied().unwrap_or(0)
    }

    pub fn reserved(&self, lender: &AccountId) -> Amount {
        self.reserved.get(lender).copied().unwrap_or(0)
    }

    pub fn tracked_balance(&self) -> Amount {
        self.total_pool
    }

    pub fn committed(&self) -> Amount {
        self.committed
    }

    pub fn escrowed(&self) -> Amount {
        self.escrowed
    }

    pub fn available_balance(&self) -> Amount {
        self.total_pool.saturating_sub(self.committed)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let actual = self.available_balance();
        PoolSnapshot {
            tracked_balance: self.total_pool,
            actual_balance: actual,
            committed: self.committed,
            escrowed_collateral: self.escrowed,
            custody_balance: actual.saturating_add(self.escrowed),
        }
    }

    pub fn lender_view(&self, lender: &AccountId) -> LenderView {
        let contribution = self.contribution(lender);
        let reserved = self.reserved(lender);
        LenderView {
            lender: *lender,
            contribution,
            reserved,
            available: contribution.saturating_sub(reserved),
        }
    }

    /// Lenders with a non-zero contribution, ordered by id.
    pub fn lenders(&self) -> Vec<LenderView> {
        self.contributions
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(lender, _)| self.lender_view(lender))
            .collect()
    }

    pub fn contributions(&self) -> &BTreeMap<AccountId, Amount> {
        &self.contributions
    }

    pub fn reservations(&self) -> &BTreeMap<AccountId, Amount> {
        &self.reserved
    }
}

/// Staged pool mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolChanges {
    /// New contribution values for touched lenders (persisted).
    pub contributions: BTreeMap<AccountId, Amount>,
    /// New reserved values for touched lenders (derived, memory only).
    pub reserved: BTreeMap<AccountId, Amount>,
    pub total_pool: Amount,
    pub committed: Amount,
    pub escrowed: Amount,
}

/// Copy-on-write overlay over a [`PoolAccount`].
pub struct PoolTxn<'a> {
    base: &'a PoolAccount,
    contributions: BTreeMap<AccountId, Amount>,
    reserved: BTreeMap<AccountId, Amount>,
    total_pool: Amount,
    committed: Amount,
    escrowed: Amount,
}

impl PoolTxn<'_> {
    pub fn contribution(&self, lender: &AccountId) -> Amount {
        self.contributions
            .get(lender)
            .copied()
            .unwrap_or_else(|| self.base.contribution(lender))
    }

    pub fn reserved(&self, lender: &AccountId) -> Amount {
        self.reserved
            .get(lender)
            .copied()
            .unwrap_or_else(|| self.base.reserved(lender))
    }

    pub fn available_balance(&self) -> Amount {
        self.total_pool.saturating_sub(self.committed)
    }

    /// Contribution not yet reserved.
    pub fn free_contribution(&self, lender: &AccountId) -> Amount {
        self.contribution(lender).saturating_sub(self.reserved(lender))
    }

    pub fn deposit(&mut self, lender: AccountId, amount: Amount) -> Result<(), EngineError> {
        if amount == 0 {
            return Err(EngineError::invalid_amount("deposit must be greater than zero"));
        }
        let contribution = self
            .contribution(&lender)
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid_amount("deposit overflows contribution"))?;
        let total = self
            .total_pool
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid_amount("deposit overflows pool"))?;
        self.contributions.insert(lender, contribution);
        self.total_pool = total;
        Ok(())
    }

    /// Encumber `amount` of the lender's free contribution.
    pub fn reserve(&mut self, lender: AccountId, amount: Amount) -> Result<(), EngineError> {
        let free = self.free_contribution(&lender);
        if free < amount {
            return Err(EngineError::InsufficientContribution {
                lender,
                required: amount,
                available: free,
            });
        }
        let reserved = self.reserved(&lender) + amount;
        self.committed = self
            .committed
            .checked_add(amount)
            .ok_or_else(|| EngineError::corrupted("committed funds overflow"))?;
        self.reserved.insert(lender, reserved);
        Ok(())
    }

    /// Drop an encumbrance created by [`reserve`](Self::reserve).
    pub fn release(&mut self, lender: AccountId, amount: Amount) -> Result<(), EngineError> {
        let contribution = self.contribution(&lender);
        if contribution < amount {
            return Err(EngineError::InsufficientContribution {
                lender,
                required: amount,
                available: contribution,
            });
        }
        let reserved = self.reserved(&lender).checked_sub(amount).ok_or_else(|| {
            EngineError::corrupted(format!("release of {amount} exceeds reserved funds of {lender}"))
        })?;
        self.committed = self.committed.checked_sub(amount).ok_or_else(|| {
            EngineError::corrupted(format!("release of {amount} exceeds committed funds"))
        })?;
        self.reserved.insert(lender, reserved);
        Ok(())
    }

    /// Add repaid interest to the lender's claim.
    pub fn credit(&mut self, lender: AccountId, amount: Amount) -> Result<(), EngineError> {
        let contribution = self
            .contribution(&lender)
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid_amount("interest overflows contribution"))?;
        self.total_pool = self
            .total_pool
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid_amount("interest overflows pool"))?;
        self.contributions.insert(lender, contribution);
        Ok(())
    }

    /// Remove unrecovered principal from the lender's claim.
    pub fn write_off(&mut self, lender: AccountId, amount: Amount) -> Result<(), EngineError> {
        let contribution = self.contribution(&lender).checked_sub(amount).ok_or_else(|| {
            EngineError::corrupted(format!("write-off of {amount} exceeds contribution of {lender}"))
        })?;
        if contribution < self.reserved(&lender) {
            return Err(EngineError::corrupted(format!(
                "write-off leaves {lender} with less contribution than reserved"
            )));
        }
        self.total_pool = self
            .total_pool
            .checked_sub(amount)
            .ok_or_else(|| EngineError::corrupted("write-off exceeds tracked pool"))?;
        self.contributions.insert(lender, contribution);
        Ok(())
    }

    pub fn hold_collateral(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.escrowed = self
            .escrowed
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid_amount("collateral overflows escrow"))?;
        Ok(())
    }

    pub fn release_collateral(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.escrowed = self
            .escrowed
            .checked_sub(amount)
            .ok_or_else(|| EngineError::corrupted("collateral release exceeds escrow"))?;
        Ok(())
    }

    pub fn finish(self) -> PoolChanges {
        PoolChanges {
            contributions: self.contributions,
            reserved: self.reserved,
            total_pool: self.total_pool,
            committed: self.committed,
            escrowed: self.escrowed,
        }
    }
}
