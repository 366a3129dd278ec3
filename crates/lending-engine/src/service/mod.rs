//! # Lending Engine Service
//!
//! The facade that sequences registry, pool accounting, persistence and the
//! event feed under one borrower-scoped transaction per call.

mod engine;
mod locks;

pub use engine::LendingEngine;
pub use locks::BorrowerLocks;
