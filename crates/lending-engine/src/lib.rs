//! # Lending Engine
//!
//! Authoritative ledger for a pooled peer-to-peer lending protocol. Lenders
//! deposit into a shared pool, borrowers post collateral and request a loan
//! from a named lender, the lender funds it, and the loan ends repaid,
//! liquidated or cancelled.
//!
//! ## Call Flow
//!
//! ```text
//! caller ──→ [LendingEngine] ── borrower lock ──→ pool lock
//!                 │
//!                 ├─ validate guards (registry + PoolTxn overlay)
//!                 ├─ LedgerStore::commit(batch)      ← nothing applied if this fails
//!                 ├─ apply PoolChanges + LoanRecord in memory
//!                 └─ publish DomainEvent ──→ [shared-bus]
//! ```
//!
//! ## Ledger Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Conservation | Tracked pool balance equals the sum of lender contributions |
//! | Commitment | Committed funds equal the principal of every Funded loan |
//! | Encumbrance | No lender has more reserved than contributed |
//! | Escrow | Escrowed collateral equals the collateral of every open loan |
//! | One loan | A borrower holds at most one non-terminal loan |
//!
//! A broken invariant found by [`LendingEngine::audit`] halts the engine.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, pool accounting, loan registry, liquidation monitor, config
//! - `ports/` - Inbound `LendingApi`, outbound `LedgerStore` and `TimeSource`
//! - `adapters/` - In-memory and file-backed stores, clocks
//! - `service/` - The `LendingEngine` facade
//!
//! ## Usage
//!
//! ```ignore
//! use lending_engine::{EngineConfig, LendingEngine};
//!
//! let engine = LendingEngine::in_memory(EngineConfig::default())?;
//! engine.deposit(lender, 100)?;
//! engine.request_loan(borrower, lender, 50, 5)?;
//! engine.fund_loan(lender, borrower)?;
//! engine.repay_loan(borrower, 53)?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileLedgerStore, InMemoryLedgerStore, ManualClock, SystemTimeSource};
pub use domain::config::EngineConfig;
pub use domain::entities::{AuditReport, LenderView, LoanRecord, LoanView, PoolSnapshot};
pub use domain::errors::{EngineError, StoreError};
pub use domain::liquidation::{LiquidationMonitor, LiquidationStatus};
pub use ports::inbound::LendingApi;
pub use ports::outbound::{EngineObserver, LedgerBatch, LedgerSnapshot, LedgerStore, TimeSource};
pub use service::LendingEngine;
