//! # Liquidation Monitor
//!
//! Stateless deadline evaluation for Funded loans. It reports eligibility
//! only; seizing collateral always takes an explicit call by the lender.

use crate::domain::entities::LoanRecord;
use serde::{Deserialize, Serialize};
use shared_types::{LoanState, Timestamp};

/// Where a loan stands relative to its repayment deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationStatus {
    /// Not Funded, so no deadline is running.
    NotFunded,
    /// Inside the window. `remaining_secs` is 0 at the deadline itself.
    Current { remaining_secs: u64 },
    /// Past the deadline; the lender may liquidate.
    Overdue { overdue_by_secs: u64 },
}

impl LiquidationStatus {
    pub fn is_overdue(&self) -> bool {
        matches!(self, LiquidationStatus::Overdue { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationMonitor {
    window_secs: u64,
}

impl LiquidationMonitor {
    pub fn new(window_secs: u64) -> Self {
        Self { window_secs }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// `funded_at + window` for Funded loans.
    pub fn due_at(&self, loan: &LoanRecord) -> Option<Timestamp> {
        if loan.state != LoanState::Funded {
            return None;
        }
        loan.funded_at
            .map(|funded| funded.saturating_add(self.window_secs))
    }

    /// Overdue iff `now > funded_at + window`.
    pub fn is_overdue(&self, loan: &LoanRecord, now: Timestamp) -> bool {
        self.due_at(loan).is_some_and(|due| now > due)
    }

    /// Seconds left before the deadline, `Some(0)` once it is reached.
    pub fn time_remaining(&self, loan: &LoanRecord, now: Timestamp) -> Option<u64> {
        self.due_at(loan).map(|due| due.saturating_sub(now))
    }

    pub fn evaluate(&self, loan: &LoanRecord, now: Timestamp) -> LiquidationStatus {
        match self.due_at(loan) {
            None => LiquidationStatus::NotFunded,
            Some(due) if now > due => LiquidationStatus::Overdue {
                overdue_by_secs: now - due,
            },
            Some(due) => LiquidationStatus::Current {
                remaining_secs: due - now,
            },
        }
    }
}
