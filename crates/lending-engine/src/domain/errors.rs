use shared_types::{AccountId, Amount, LoanState, Timestamp};
use thiserror::Error;

/// Failures of the ledger store adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Ledger file already in use: {path}")]
    Locked { path: String },

    #[error("Corrupt ledger data: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io {
            message: e.to_string(),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Every way an engine call can fail.
///
/// All variants except `Storage`, `LedgerCorrupted` and `Halted` are guard
/// rejections: the call was refused before anything was written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Borrower {borrower} already has a {state} loan")]
    DuplicateActiveLoan {
        borrower: AccountId,
        state: LoanState,
    },

    #[error("Under-collateralized: requested {requested}, collateral {collateral}, minimum {minimum}")]
    UnderCollateralized {
        requested: Amount,
        collateral: Amount,
        minimum: Amount,
    },

    #[error("Account {account} cannot lend to itself")]
    SelfDealing { account: AccountId },

    #[error("Insufficient pool funds: requested {requested}, available {available}")]
    InsufficientPoolFunds { requested: Amount, available: Amount },

    #[error("Insufficient contribution for {lender}: required {required}, available {available}")]
    InsufficientContribution {
        lender: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("Wrong lender for {borrower}: loan names {expected}, caller is {caller}")]
    WrongLender {
        borrower: AccountId,
        expected: AccountId,
        caller: AccountId,
    },

    #[error("Incorrect repay amount: expected {expected}, paid {paid}")]
    IncorrectRepayAmount { expected: Amount, paid: Amount },

    #[error("Loan not overdue: due at {due_at}, now {now}")]
    NotOverdue { due_at: Timestamp, now: Timestamp },

    #[error("No loan for borrower {borrower}")]
    NoSuchLoan { borrower: AccountId },

    #[error("Loan for {borrower} is {state}, expected {expected}")]
    WrongState {
        borrower: AccountId,
        state: LoanState,
        expected: LoanState,
    },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Ledger corrupted: {detail}")]
    LedgerCorrupted { detail: String },

    #[error("Engine halted after a ledger consistency fault")]
    Halted,
}

impl EngineError {
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        EngineError::InvalidAmount(reason.into())
    }

    pub fn corrupted(detail: impl Into<String>) -> Self {
        EngineError::LedgerCorrupted {
            detail: detail.into(),
        }
    }

    /// Stable snake_case label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidAmount(_) => "invalid_amount",
            EngineError::DuplicateActiveLoan { .. } => "duplicate_active_loan",
            EngineError::UnderCollateralized { .. } => "under_collateralized",
            EngineError::SelfDealing { .. } => "self_dealing",
            EngineError::InsufficientPoolFunds { .. } => "insufficient_pool_funds",
            EngineError::InsufficientContribution { .. } => "insufficient_contribution",
            EngineError::WrongLender { .. } => "wrong_lender",
            EngineError::IncorrectRepayAmount { .. } => "incorrect_repay_amount",
            EngineError::NotOverdue { .. } => "not_overdue",
            EngineError::NoSuchLoan { .. } => "no_such_loan",
            EngineError::WrongState { .. } => "wrong_state",
            EngineError::InvalidConfig(_) => "invalid_config",
            EngineError::Storage(_) => "storage",
            EngineError::LedgerCorrupted { .. } => "ledger_corrupted",
            EngineError::Halted => "halted",
        }
    }

    /// Consistency faults stop the engine for good.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::LedgerCorrupted { .. })
    }
}
