//! # Shared Types Crate
//!
//! Identity and money primitives used across the Pool-Lend workspace.
//!
//! ## Design Principles
//!
//! - **Integer money only**: every amount is a `u128` count of minor units.
//!   Rates and ratios are basis points. No floating point touches a balance.
//! - **Typed identities**: lenders and borrowers are `AccountId`s, a 20-byte
//!   address rendered as `0x`-prefixed hex.
//! - **One lifecycle enum**: `LoanState` is shared by the engine, the event
//!   feed and the runtime so state names never drift.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
