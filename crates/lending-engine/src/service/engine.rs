use crate::adapters::{InMemoryLedgerStore, SystemTimeSource};
use crate::domain::config::EngineConfig;
use crate::domain::entities::{AuditReport, LenderView, LoanRecord, LoanView, PoolSnapshot};
use crate::domain::errors::EngineError;
use crate::domain::interest;
use crate::domain::liquidation::{LiquidationMonitor, LiquidationStatus};
use crate::domain::pool::{PoolAccount, PoolChanges};
use crate::domain::registry::{LoanRegistry, LoanTerms};
use crate::ports::inbound::LendingApi;
use crate::ports::outbound::{EngineObserver, LedgerBatch, LedgerStore, TimeSource};
use crate::service::locks::BorrowerLocks;
use parking_lot::{Mutex, MutexGuard};
use shared_bus::{
    DomainEvent, EventFilter, EventKind, EventPublisher, EventStream, EventSubscriber,
    InMemoryEventBus,
};
use shared_types::{AccountId, Amount, LoanState};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The engine facade.
///
/// Each mutating call runs as one transaction:
///
/// 1. take the borrower's lock, then the pool lock
/// 2. check every guard against the registry and a [`PoolTxn`] overlay
/// 3. commit the resulting [`LedgerBatch`] to the store
/// 4. apply the pool changes and the loan record in memory
/// 5. publish the event, still under the pool lock
///
/// Deposits skip step 1. A failure at any step before 4 leaves no trace.
///
/// [`PoolTxn`]: crate::domain::pool::PoolTxn
pub struct LendingEngine {
    config: EngineConfig,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn TimeSource>,
    bus: Arc<InMemoryEventBus>,
    observer: Option<Arc<dyn EngineObserver>>,
    registry: LoanRegistry,
    pool: Mutex<PoolAccount>,
    locks: BorrowerLocks,
    monitor: LiquidationMonitor,
    halted: AtomicBool,
}

impl LendingEngine {
    /// Load the ledger from `store`, rebuild derived balances and audit them.
    pub fn open(
        config: EngineConfig,
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let snapshot = store.load()?;
        for (key, loan) in &snapshot.loans {
            if *key != loan.borrower {
                return Err(EngineError::corrupted(format!(
                    "loan row {key} belongs to borrower {}",
                    loan.borrower
                )));
            }
        }

        let pool = PoolAccount::rebuild(&snapshot.contributions, snapshot.loans.values())?;
        let registry = LoanRegistry::from_records(snapshot.loans.into_values());
        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.event_channel_capacity,
            config.recent_events_capacity,
        ));

        let engine = Self {
            monitor: LiquidationMonitor::new(config.repayment_window_secs),
            config,
            store,
            clock,
            bus,
            observer: None,
            registry,
            pool: Mutex::new(pool),
            locks: BorrowerLocks::new(),
            halted: AtomicBool::new(false),
        };

        let report = engine.audit()?;
        info!(
            backend = engine.store.backend(),
            lenders = report.lenders,
            loans = report.loans,
            active = report.active_loans,
            tracked = report.tracked_balance,
            "Lending engine opened"
        );
        Ok(engine)
    }

    /// Fresh engine over a volatile store and the system clock.
    pub fn in_memory(config: EngineConfig) -> Result<Self, EngineError> {
        Self::open(
            config,
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(SystemTimeSource),
        )
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn monitor(&self) -> &LiquidationMonitor {
        &self.monitor
    }

    /// Shared handle to the event feed.
    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Filtered variant of [`LendingApi::subscribe_events`].
    pub fn subscribe_filtered(&self, filter: EventFilter) -> EventStream {
        self.bus.event_stream(filter)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    // =========================================================================
    // TRANSACTION PLUMBING
    // =========================================================================

    fn lock_pool(&self) -> Result<MutexGuard<'_, PoolAccount>, EngineError> {
        let pool = self.pool.lock();
        if self.is_halted() {
            return Err(EngineError::Halted);
        }
        Ok(pool)
    }

    fn view(&self, loan: &LoanRecord) -> LoanView {
        LoanView::from_record(loan, self.monitor.due_at(loan))
    }

    fn load_loan(&self, borrower: AccountId) -> Result<LoanRecord, EngineError> {
        self.registry
            .get(&borrower)
            .ok_or(EngineError::NoSuchLoan { borrower })
    }

    /// Persist, then apply. Called with the pool lock held.
    fn commit(
        &self,
        pool: &mut PoolAccount,
        changes: PoolChanges,
        loan: Option<LoanRecord>,
        event: Option<DomainEvent>,
    ) -> Result<(), EngineError> {
        let batch = LedgerBatch {
            contributions: changes
                .contributions
                .iter()
                .map(|(lender, amount)| (*lender, *amount))
                .collect(),
            loans: loan.iter().cloned().collect(),
        };
        self.store.commit(&batch)?;

        pool.apply(changes);
        if let Some(loan) = loan {
            self.registry.insert(loan);
        }
        if let Some(event) = event {
            self.bus.publish(event);
        }
        Ok(())
    }

    /// Report the outcome of a call; halt on consistency faults.
    fn settle<T>(
        &self,
        operation: &'static str,
        result: Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        match &result {
            Ok(_) => {
                if let Some(observer) = &self.observer {
                    observer.completed(operation);
                }
            }
            Err(err) => self.reject(operation, err),
        }
        result
    }

    fn reject(&self, operation: &'static str, err: &EngineError) {
        match err {
            EngineError::LedgerCorrupted { .. } => {
                self.halted.store(true, Ordering::SeqCst);
                error!(operation, error = %err, "Ledger consistency fault, engine halted");
            }
            EngineError::Storage(_) => {
                warn!(operation, error = %err, "Ledger store commit failed");
            }
            _ => {
                debug!(operation, kind = err.kind(), error = %err, "Call rejected");
            }
        }
        if let Some(observer) = &self.observer {
            observer.rejected(operation, err);
        }
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    fn try_deposit(&self, lender: AccountId, amount: Amount) -> Result<PoolSnapshot, EngineError> {
        let mut pool = self.lock_pool()?;
        let mut txn = pool.begin();
        txn.deposit(lender, amount)?;
        let changes = txn.finish();
        self.commit(&mut pool, changes, None, None)?;

        info!(lender = %lender, amount, tracked = pool.tracked_balance(), "Deposit accepted");
        Ok(pool.snapshot())
    }

    fn try_request_loan(
        &self,
        borrower: AccountId,
        lender: AccountId,
        amount: Amount,
        collateral: Amount,
    ) -> Result<LoanView, EngineError> {
        let terms = LoanTerms {
            borrower,
            lender,
            requested_amount: amount,
            collateral_amount: collateral,
            interest_rate_bps: self.config.interest_rate_bps,
            min_collateral_ratio_bps: self.config.min_collateral_ratio_bps,
        };

        let handle = self.locks.handle(borrower);
        let _borrower = handle.lock();
        let mut pool = self.lock_pool()?;
        let now = self.clock.now();

        let loan = terms.open(now)?;
        if let Some(existing) = self.registry.active(&borrower) {
            return Err(EngineError::DuplicateActiveLoan {
                borrower,
                state: existing.state,
            });
        }
        terms.check_collateral()?;
        let available = pool.available_balance();
        if available < amount {
            return Err(EngineError::InsufficientPoolFunds {
                requested: amount,
                available,
            });
        }

        let mut txn = pool.begin();
        txn.hold_collateral(collateral)?;
        let changes = txn.finish();

        let view = self.view(&loan);
        let event = DomainEvent::new(EventKind::Requested, borrower, Some(lender), amount, now);
        self.commit(&mut pool, changes, Some(loan), Some(event))?;

        info!(
            borrower = %borrower,
            lender = %lender,
            amount,
            collateral,
            repay_amount = view.repay_amount,
            "Loan requested"
        );
        Ok(view)
    }

    fn try_cancel_loan(&self, borrower: AccountId) -> Result<LoanView, EngineError> {
        let handle = self.locks.handle(borrower);
        let _borrower = handle.lock();
        let mut pool = self.lock_pool()?;
        let now = self.clock.now();

        let mut loan = self.load_loan(borrower)?;
        loan.expect_state(LoanState::Requested)?;

        let mut txn = pool.begin();
        txn.release_collateral(loan.collateral_amount)?;
        let changes = txn.finish();
        loan.mark_cancelled(now)?;

        let view = self.view(&loan);
        let event = DomainEvent::new(
            EventKind::LoanCancelled,
            borrower,
            None,
            loan.collateral_amount,
            now,
        );
        self.commit(&mut pool, changes, Some(loan), Some(event))?;

        info!(borrower = %borrower, collateral = view.collateral_amount, "Loan cancelled");
        Ok(view)
    }

    fn try_fund_loan(&self, lender: AccountId, borrower: AccountId) -> Result<LoanView, EngineError> {
        let handle = self.locks.handle(borrower);
        let _borrower = handle.lock();
        let mut pool = self.lock_pool()?;
        let now = self.clock.now();

        let mut loan = self.load_loan(borrower)?;
        loan.expect_state(LoanState::Requested)?;
        loan.expect_lender(&lender)?;

        let mut txn = pool.begin();
        txn.reserve(lender, loan.requested_amount)?;
        let changes = txn.finish();
        loan.mark_funded(now)?;

        let view = self.view(&loan);
        let event = DomainEvent::new(
            EventKind::Funded,
            borrower,
            Some(lender),
            loan.requested_amount,
            now,
        );
        self.commit(&mut pool, changes, Some(loan), Some(event))?;

        info!(
            borrower = %borrower,
            lender = %lender,
            amount = view.requested_amount,
            due_at = ?view.due_at,
            "Loan funded"
        );
        Ok(view)
    }

    fn try_repay_loan(&self, borrower: AccountId, paid: Amount) -> Result<LoanView, EngineError> {
        let handle = self.locks.handle(borrower);
        let _borrower = handle.lock();
        let mut pool = self.lock_pool()?;
        let now = self.clock.now();

        let mut loan = self.load_loan(borrower)?;
        loan.expect_state(LoanState::Funded)?;
        if paid != loan.repay_amount {
            return Err(EngineError::IncorrectRepayAmount {
                expected: loan.repay_amount,
                paid,
            });
        }

        let mut txn = pool.begin();
        txn.release(loan.lender, loan.requested_amount)?;
        txn.credit(loan.lender, loan.interest())?;
        txn.release_collateral(loan.collateral_amount)?;
        let changes = txn.finish();
        loan.mark_repaid(now)?;

        let view = self.view(&loan);
        let event = DomainEvent::new(
            EventKind::Repaid,
            borrower,
            Some(loan.lender),
            loan.repay_amount,
            now,
        );
        self.commit(&mut pool, changes, Some(loan), Some(event))?;

        info!(
            borrower = %borrower,
            lender = %view.lender,
            paid,
            interest = view.repay_amount - view.requested_amount,
            "Loan repaid"
        );
        Ok(view)
    }

    fn try_liquidate(&self, lender: AccountId, borrower: AccountId) -> Result<LoanView, EngineError> {
        let handle = self.locks.handle(borrower);
        let _borrower = handle.lock();
        let mut pool = self.lock_pool()?;
        let now = self.clock.now();

        let mut loan = self.load_loan(borrower)?;
        loan.expect_state(LoanState::Funded)?;
        loan.expect_lender(&lender)?;
        let due_at = self
            .monitor
            .due_at(&loan)
            .ok_or_else(|| EngineError::corrupted(format!("funded loan of {borrower} has no funding time")))?;
        if now <= due_at {
            return Err(EngineError::NotOverdue { due_at, now });
        }

        let mut txn = pool.begin();
        txn.release(lender, loan.requested_amount)?;
        txn.write_off(lender, loan.requested_amount)?;
        txn.release_collateral(loan.collateral_amount)?;
        let changes = txn.finish();
        loan.mark_defaulted(now)?;

        let view = self.view(&loan);
        let shortfall = loan.shortfall;
        let event = DomainEvent::new(
            EventKind::Defaulted,
            borrower,
            Some(lender),
            loan.collateral_amount,
            now,
        );
        self.commit(&mut pool, changes, Some(loan), Some(event))?;

        if shortfall > 0 {
            warn!(
                borrower = %borrower,
                lender = %lender,
                principal = view.requested_amount,
                collateral = view.collateral_amount,
                shortfall,
                "Liquidation left a shortfall"
            );
        }
        info!(
            borrower = %borrower,
            lender = %lender,
            collateral = view.collateral_amount,
            "Collateral liquidated"
        );
        Ok(view)
    }

    fn try_audit(&self) -> Result<AuditReport, EngineError> {
        let pool = self.lock_pool()?;
        let loans = self.registry.all();

        let contributions_sum = checked_sum(pool.contributions().values().copied())
            .ok_or_else(|| EngineError::corrupted("contribution sum overflows"))?;
        if contributions_sum != pool.tracked_balance() {
            return Err(EngineError::corrupted(format!(
                "tracked balance {} != sum of contributions {}",
                pool.tracked_balance(),
                contributions_sum
            )));
        }

        let reserved_sum = checked_sum(pool.reservations().values().copied())
            .ok_or_else(|| EngineError::corrupted("reserved sum overflows"))?;
        if reserved_sum != pool.committed() {
            return Err(EngineError::corrupted(format!(
                "committed {} != sum of reservations {}",
                pool.committed(),
                reserved_sum
            )));
        }

        let mut funded_by_lender: BTreeMap<AccountId, Amount> = BTreeMap::new();
        let mut escrow_sum: Amount = 0;
        let mut active = 0usize;
        let mut funded = 0usize;
        for loan in &loans {
            if loan.borrower == loan.lender {
                return Err(EngineError::corrupted(format!(
                    "loan of {} names itself as lender",
                    loan.borrower
                )));
            }
            if loan.is_active() {
                active += 1;
            }
            if loan.state == LoanState::Funded {
                if loan.funded_at.is_none() {
                    return Err(EngineError::corrupted(format!(
                        "funded loan of {} has no funding time",
                        loan.borrower
                    )));
                }
                funded += 1;
                let slot = funded_by_lender.entry(loan.lender).or_insert(0);
                *slot = slot
                    .checked_add(loan.requested_amount)
                    .ok_or_else(|| EngineError::corrupted("funded principal overflows"))?;
            }
            escrow_sum = escrow_sum
                .checked_add(loan.escrowed_collateral())
                .ok_or_else(|| EngineError::corrupted("escrow sum overflows"))?;
        }

        if funded_by_lender != *pool.reservations() {
            return Err(EngineError::corrupted(
                "per-lender reservations disagree with funded loans",
            ));
        }
        if escrow_sum != pool.escrowed() {
            return Err(EngineError::corrupted(format!(
                "escrowed collateral {} != collateral of open loans {}",
                pool.escrowed(),
                escrow_sum
            )));
        }
        for (lender, reserved) in pool.reservations() {
            let contribution = pool.contribution(lender);
            if *reserved > contribution {
                return Err(EngineError::corrupted(format!(
                    "{lender} has {reserved} reserved against a contribution of {contribution}"
                )));
            }
        }

        Ok(AuditReport {
            tracked_balance: pool.tracked_balance(),
            committed: pool.committed(),
            escrowed_collateral: pool.escrowed(),
            lenders: pool.lenders().len(),
            loans: loans.len(),
            active_loans: active,
            funded_loans: funded,
            checked_at: self.clock.now(),
        })
    }

    #[cfg(test)]
    pub(crate) fn corrupt_pool_for_test(&self, mutate: impl FnOnce(&mut PoolAccount)) {
        let mut pool = self.pool.lock();
        mutate(&mut pool);
    }
}

fn checked_sum(mut values: impl Iterator<Item = Amount>) -> Option<Amount> {
    values.try_fold(0u128, |acc, v| acc.checked_add(v))
}

impl LendingApi for LendingEngine {
    fn deposit(&self, lender: AccountId, amount: Amount) -> Result<PoolSnapshot, EngineError> {
        self.settle("deposit", self.try_deposit(lender, amount))
    }

    fn request_loan(
        &self,
        borrower: AccountId,
        lender: AccountId,
        amount: Amount,
        collateral: Amount,
    ) -> Result<LoanView, EngineError> {
        self.settle(
            "request_loan",
            self.try_request_loan(borrower, lender, amount, collateral),
        )
    }

    fn cancel_loan(&self, borrower: AccountId) -> Result<LoanView, EngineError> {
        self.settle("cancel_loan", self.try_cancel_loan(borrower))
    }

    fn fund_loan(&self, lender: AccountId, borrower: AccountId) -> Result<LoanView, EngineError> {
        self.settle("fund_loan", self.try_fund_loan(lender, borrower))
    }

    fn repay_loan(&self, borrower: AccountId, paid: Amount) -> Result<LoanView, EngineError> {
        self.settle("repay_loan", self.try_repay_loan(borrower, paid))
    }

    fn liquidate_collateral(
        &self,
        lender: AccountId,
        borrower: AccountId,
    ) -> Result<LoanView, EngineError> {
        self.settle("liquidate_collateral", self.try_liquidate(lender, borrower))
    }

    fn get_loan(&self, borrower: AccountId) -> Option<LoanView> {
        self.registry.get(&borrower).map(|loan| self.view(&loan))
    }

    fn pool_snapshot(&self) -> PoolSnapshot {
        self.pool.lock().snapshot()
    }

    fn subscribe_events(&self) -> EventStream {
        self.bus.event_stream(EventFilter::all())
    }

    fn recent_events(&self) -> Vec<DomainEvent> {
        self.bus.recent()
    }

    fn list_lenders(&self) -> Vec<LenderView> {
        self.pool.lock().lenders()
    }

    fn lender_contribution(&self, lender: AccountId) -> LenderView {
        self.pool.lock().lender_view(&lender)
    }

    fn pending_requests_for(&self, lender: AccountId) -> Vec<LoanView> {
        self.registry
            .select(|loan| loan.state == LoanState::Requested && loan.lender == lender)
            .iter()
            .map(|loan| self.view(loan))
            .collect()
    }

    fn active_loans(&self) -> Vec<LoanView> {
        self.registry
            .select(LoanRecord::is_active)
            .iter()
            .map(|loan| self.view(loan))
            .collect()
    }

    fn quote_repayment(&self, amount: Amount) -> Result<Amount, EngineError> {
        if amount == 0 {
            return Err(EngineError::invalid_amount("amount must be greater than zero"));
        }
        interest::repay_amount(amount, self.config.interest_rate_bps)
            .ok_or_else(|| EngineError::invalid_amount("repay amount overflows"))
    }

    fn repayment_status(&self, borrower: AccountId) -> Result<LiquidationStatus, EngineError> {
        let loan = self.load_loan(borrower)?;
        Ok(self.monitor.evaluate(&loan, self.clock.now()))
    }

    fn overdue_loans(&self) -> Vec<LoanView> {
        let now = self.clock.now();
        self.registry
            .select(|loan| self.monitor.is_overdue(loan, now))
            .iter()
            .map(|loan| self.view(loan))
            .collect()
    }

    fn audit(&self) -> Result<AuditReport, EngineError> {
        self.settle("audit", self.try_audit())
    }
}
