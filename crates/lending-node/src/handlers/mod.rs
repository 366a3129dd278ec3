//! # Background Handlers
//!
//! Long-running tasks spawned by the runtime. Each one stops when the shutdown
//! watch channel flips.
//!
//! | Handler | Input | Output |
//! |---------|-------|--------|
//! | `EventMetricsHandler` | event bus | lifecycle counters, shortfall counter |
//! | `LiquidationWatch` | `overdue_loans()` on a timer | overdue gauge, eligibility warnings |
//! | `LedgerAuditor` | `audit()` on a timer | pool gauges, halt alarm |

pub mod event_metrics;
pub mod ledger_audit;
pub mod liquidation_watch;

pub use event_metrics::EventMetricsHandler;
pub use ledger_audit::LedgerAuditor;
pub use liquidation_watch::LiquidationWatch;
