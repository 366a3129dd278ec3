//! # Domain Layer
//!
//! Pure ledger logic. Nothing here performs I/O or reads the clock.

pub mod config;
pub mod entities;
pub mod errors;
pub mod interest;
pub mod liquidation;
pub mod pool;
pub mod registry;
