//! # Lending Events
//!
//! The five domain events emitted by the engine facade and the filter
//! observers use to pick the ones they care about.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Amount, Timestamp};
use std::fmt;

/// Kind of state change recorded by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Borrower posted a request. Amount is the requested principal.
    Requested,
    /// Lender funded the request. Amount is the disbursed principal.
    Funded,
    /// Borrower repaid. Amount is principal plus interest.
    Repaid,
    /// Borrower withdrew the request. Amount is the returned collateral.
    LoanCancelled,
    /// Lender seized the collateral. Amount is the seized collateral.
    Defaulted,
}

impl EventKind {
    /// All kinds in lifecycle order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Requested,
        EventKind::Funded,
        EventKind::Repaid,
        EventKind::LoanCancelled,
        EventKind::Defaulted,
    ];

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Funded => "funded",
            Self::Repaid => "repaid",
            Self::LoanCancelled => "loan_cancelled",
            Self::Defaulted => "defaulted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of the event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Assigned by the bus on publish; zero until then.
    pub sequence: u64,
    pub kind: EventKind,
    pub borrower: AccountId,
    /// `None` for cancellations.
    pub lender: Option<AccountId>,
    pub amount: Amount,
    pub timestamp: Timestamp,
}

impl DomainEvent {
    /// Build an unsequenced event.
    pub fn new(
        kind: EventKind,
        borrower: AccountId,
        lender: Option<AccountId>,
        amount: Amount,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sequence: 0,
            kind,
            borrower,
            lender,
            amount,
            timestamp,
        }
    }

    /// Whether `account` appears as borrower or lender.
    pub fn involves(&self, account: &AccountId) -> bool {
        self.borrower == *account || self.lender.as_ref() == Some(account)
    }
}

/// Filter for subscribing to a subset of events.
///
/// Empty `kinds` means every kind. `account` restricts to events where the
/// account is the borrower or the lender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub kinds: Vec<EventKind>,
    pub account: Option<AccountId>,
}

impl EventFilter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match only the given kinds.
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds,
            account: None,
        }
    }

    /// Match only events involving `account`.
    pub fn account(account: AccountId) -> Self {
        Self {
            kinds: Vec::new(),
            account: Some(account),
        }
    }

    /// Narrow an existing filter to `account`.
    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    pub fn matches(&self, event: &DomainEvent) -> bool {
        let kind_ok = self.kinds.is_empty() || self.kinds.contains(&event.kind);
        let account_ok = self.account.map_or(true, |a| event.involves(&a));
        kind_ok && account_ok
    }
}
