//! # Inbound Ports (Driving Ports)
//!
//! The operations a client (UI, node runtime, tests) calls on the engine.

use crate::domain::entities::{AuditReport, LenderView, LoanView, PoolSnapshot};
use crate::domain::errors::EngineError;
use crate::domain::liquidation::LiquidationStatus;
use shared_bus::{DomainEvent, EventStream};
use shared_types::{AccountId, Amount};

/// Primary API of the lending engine.
///
/// Every mutating call is atomic: on `Err` nothing was persisted, nothing
/// changed in memory and no event was published.
pub trait LendingApi: Send + Sync {
    /// Add funds to the pool on behalf of `lender`.
    ///
    /// ## Errors
    ///
    /// - `InvalidAmount`: zero or overflowing amount
    fn deposit(&self, lender: AccountId, amount: Amount) -> Result<PoolSnapshot, EngineError>;

    /// Open a loan request against `lender`, escrowing the collateral.
    ///
    /// ## Errors (checked in this order)
    ///
    /// - `InvalidAmount`: zero amount or zero collateral
    /// - `SelfDealing`: `lender == borrower`
    /// - `DuplicateActiveLoan`: borrower already has a non-terminal loan
    /// - `UnderCollateralized`: collateral below the minimum ratio
    /// - `InsufficientPoolFunds`: available balance below the amount
    fn request_loan(
        &self,
        borrower: AccountId,
        lender: AccountId,
        amount: Amount,
        collateral: Amount,
    ) -> Result<LoanView, EngineError>;

    /// Withdraw a Requested loan and return its collateral.
    fn cancel_loan(&self, borrower: AccountId) -> Result<LoanView, EngineError>;

    /// Disburse a Requested loan from the lender's contribution.
    ///
    /// ## Errors (checked in this order)
    ///
    /// - `NoSuchLoan`, `WrongState`
    /// - `WrongLender`: caller is not the loan's lender
    /// - `InsufficientContribution`: lender's free contribution below the amount
    fn fund_loan(&self, lender: AccountId, borrower: AccountId) -> Result<LoanView, EngineError>;

    /// Repay a Funded loan. `paid` must equal the repay amount exactly.
    fn repay_loan(&self, borrower: AccountId, paid: Amount) -> Result<LoanView, EngineError>;

    /// Seize the collateral of an overdue Funded loan.
    ///
    /// ## Errors (checked in this order)
    ///
    /// - `NoSuchLoan`, `WrongState`
    /// - `WrongLender`: caller is not the loan's lender
    /// - `NotOverdue`: `now <= funded_at + window`
    fn liquidate_collateral(
        &self,
        lender: AccountId,
        borrower: AccountId,
    ) -> Result<LoanView, EngineError>;

    /// Keyed lookup of the borrower's current or last loan.
    fn get_loan(&self, borrower: AccountId) -> Option<LoanView>;

    fn pool_snapshot(&self) -> PoolSnapshot;

    /// Events published from now on. Nothing is replayed.
    fn subscribe_events(&self) -> EventStream;

    /// The latest events, newest first.
    fn recent_events(&self) -> Vec<DomainEvent>;

    fn list_lenders(&self) -> Vec<LenderView>;

    fn lender_contribution(&self, lender: AccountId) -> LenderView;

    /// Requested loans naming `lender`.
    fn pending_requests_for(&self, lender: AccountId) -> Vec<LoanView>;

    /// All non-terminal loans.
    fn active_loans(&self) -> Vec<LoanView>;

    /// Repay amount a request of `amount` would carry.
    fn quote_repayment(&self, amount: Amount) -> Result<Amount, EngineError>;

    fn repayment_status(&self, borrower: AccountId) -> Result<LiquidationStatus, EngineError>;

    /// Funded loans past their deadline.
    fn overdue_loans(&self) -> Vec<LoanView>;

    /// Recompute every aggregate; halts the engine on mismatch.
    fn audit(&self) -> Result<AuditReport, EngineError>;
}
