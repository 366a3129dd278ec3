//! Periodic scan for loans past their repayment deadline.
//!
//! Reports eligibility only. Seizing collateral stays an explicit lender call.

use lending_engine::{LendingApi, LendingEngine, LoanView};
use lending_telemetry::OVERDUE_LOANS;
use shared_types::{AccountId, Timestamp};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct LiquidationWatch {
    engine: Arc<LendingEngine>,
    interval: Duration,
    /// (borrower, due_at) already announced; a loan is warned about once.
    reported: HashSet<(AccountId, Timestamp)>,
}

impl LiquidationWatch {
    pub fn new(engine: Arc<LendingEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            reported: HashSet::new(),
        }
    }

    /// One pass. Returns the loans that became overdue since the last pass.
    pub fn scan(&mut self) -> Vec<LoanView> {
        let overdue = self.engine.overdue_loans();
        OVERDUE_LOANS.set(overdue.len() as f64);

        let mut current = HashSet::with_capacity(overdue.len());
        let mut newly = Vec::new();
        for loan in overdue {
            let Some(due_at) = loan.due_at else { continue };
            let key = (loan.borrower, due_at);
            current.insert(key);
            if !self.reported.contains(&key) {
                warn!(
                    borrower = %loan.borrower,
                    lender = %loan.lender,
                    due_at,
                    principal = loan.requested_amount,
                    collateral = loan.collateral_amount,
                    "Loan eligible for liquidation"
                );
                newly.push(loan);
            }
        }
        self.reported = current;
        newly
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Liquidation watch started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scan();
                }
                _ = shutdown.changed() => {
                    info!("Liquidation watch received shutdown signal");
                    break;
                }
            }
        }
    }
}
