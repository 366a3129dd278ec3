//! # Ports
//!
//! - `inbound` - `LendingApi`, the operations the engine offers
//! - `outbound` - `LedgerStore` and `TimeSource`, what the engine needs

pub mod inbound;
pub mod outbound;
