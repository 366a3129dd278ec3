//! # Error Types
//!
//! Parse errors for the shared primitives.

use thiserror::Error;

/// Errors produced when parsing an `AccountId` from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAccountIdError {
    /// Input is not valid hexadecimal.
    #[error("Invalid hex in account id: {0}")]
    InvalidHex(String),

    /// Input decoded to the wrong number of bytes.
    #[error("Invalid account id length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors produced when parsing a `LoanState` from its wire code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown loan state code: {0}")]
pub struct UnknownLoanState(pub u8);
