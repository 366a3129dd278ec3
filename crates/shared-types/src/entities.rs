//! # Core Domain Entities
//!
//! Primitives shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Identity**: `AccountId`
//! - **Money**: `Amount`, `BasisPoints`
//! - **Time**: `Timestamp`
//! - **Lifecycle**: `LoanState`

use crate::errors::{ParseAccountIdError, UnknownLoanState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 20-byte account address identifying a lender or a borrower.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// Length of an account id in bytes.
    pub const LEN: usize = 20;

    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Build an id from a slice, rejecting anything that is not 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseAccountIdError> {
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseAccountIdError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Abbreviated form for log lines, e.g. `0x5bff…0fc2`.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    /// Parses `0x`-prefixed or bare hex, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| ParseAccountIdError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// CLUSTER B: MONEY
// =============================================================================

/// Monetary amount in integer minor units (e.g. wei).
pub type Amount = u128;

/// Denominator for basis-point arithmetic: 10 000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// A rate or ratio expressed in basis points (1/100 of a percent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(pub u32);

impl BasisPoints {
    /// Wrap a raw basis-point value.
    pub const fn new(bps: u32) -> Self {
        Self(bps)
    }

    /// Raw basis-point value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// `amount * self / 10_000`, rounded down. `None` on overflow.
    pub fn apply_floor(self, amount: Amount) -> Option<Amount> {
        amount
            .checked_mul(u128::from(self.0))
            .map(|scaled| scaled / BPS_DENOMINATOR)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// CLUSTER C: TIME
// =============================================================================

/// Unix timestamp in whole seconds.
pub type Timestamp = u64;

// =============================================================================
// CLUSTER D: LIFECYCLE
// =============================================================================

/// Lifecycle state of a loan.
///
/// ```text
/// Requested ──fund──→ Funded ──repay──→ Repaid
///     │                 │
///     │                 └──liquidate──→ Defaulted
///     └──cancel──→ Cancelled
/// ```
///
/// Wire codes follow declaration order (`Requested = 0`, `Funded = 1`, …).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanState {
    /// Borrower posted collateral and is waiting for the lender.
    Requested,
    /// Lender disbursed the principal; the repayment window is running.
    Funded,
    /// Borrower repaid principal plus interest.
    Repaid,
    /// Lender seized the collateral after the window elapsed.
    Defaulted,
    /// Borrower withdrew the request before funding.
    Cancelled,
}

impl LoanState {
    /// Terminal states free the borrower slot for a new request.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Repaid | Self::Defaulted | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal lifecycle edge.
    pub fn can_transition_to(self, next: LoanState) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Funded)
                | (Self::Requested, Self::Cancelled)
                | (Self::Funded, Self::Repaid)
                | (Self::Funded, Self::Defaulted)
        )
    }

    /// Stable wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Requested => 0,
            Self::Funded => 1,
            Self::Repaid => 2,
            Self::Defaulted => 3,
            Self::Cancelled => 4,
        }
    }

    /// Lowercase name for logs and labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Funded => "funded",
            Self::Repaid => "repaid",
            Self::Defaulted => "defaulted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<u8> for LoanState {
    type Error = UnknownLoanState;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Requested),
            1 => Ok(Self::Funded),
            2 => Ok(Self::Repaid),
            3 => Ok(Self::Defaulted),
            4 => Ok(Self::Cancelled),
            other => Err(UnknownLoanState(other)),
        }
    }
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
