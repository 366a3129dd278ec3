//! Engine configuration.

use crate::domain::errors::EngineError;
use serde::{Deserialize, Serialize};
use shared_types::BasisPoints;

/// Upper bound on the interest rate: 1000%.
pub const MAX_INTEREST_RATE_BPS: u32 = 100_000;

/// Lending parameters. Every field has a default so partial TOML tables work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed interest charged on every loan (600 = 6%).
    pub interest_rate_bps: BasisPoints,
    /// Minimum collateral as a share of the requested amount (1000 = 10%).
    pub min_collateral_ratio_bps: BasisPoints,
    /// Seconds after funding before the lender may liquidate.
    pub repayment_window_secs: u64,
    /// Entries kept in the recent-events ring.
    pub recent_events_capacity: usize,
    /// Broadcast buffer per subscriber.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interest_rate_bps: BasisPoints::new(600),
            min_collateral_ratio_bps: BasisPoints::new(1_000),
            repayment_window_secs: 60,
            recent_events_capacity: 10,
            event_channel_capacity: 1_024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.repayment_window_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "repayment_window_secs must be > 0".into(),
            ));
        }
        if self.min_collateral_ratio_bps.get() == 0 {
            return Err(EngineError::InvalidConfig(
                "min_collateral_ratio_bps must be > 0".into(),
            ));
        }
        if self.interest_rate_bps.get() > MAX_INTEREST_RATE_BPS {
            return Err(EngineError::InvalidConfig(format!(
                "interest_rate_bps {} exceeds {}",
                self.interest_rate_bps.get(),
                MAX_INTEREST_RATE_BPS
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "event_channel_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }
}
