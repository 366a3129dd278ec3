//! Prometheus metrics for the lending node.
//!
//! Naming convention: `pl_<area>_<metric>_<unit>`.
//!
//! Lifecycle counters are fed from the event stream, rejection counters from
//! the engine observer, and the pool gauges from the periodic audit.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // POOL
    // =========================================================================

    pub static ref POOL_DEPOSITS: Counter = Counter::new(
        "pl_pool_deposits_total",
        "Accepted deposits"
    ).expect("metric creation failed");

    pub static ref POOL_TRACKED_BALANCE: Gauge = Gauge::new(
        "pl_pool_tracked_balance",
        "Sum of lender contributions"
    ).expect("metric creation failed");

    pub static ref POOL_AVAILABLE_BALANCE: Gauge = Gauge::new(
        "pl_pool_available_balance",
        "Tracked balance minus committed funds"
    ).expect("metric creation failed");

    pub static ref POOL_COMMITTED: Gauge = Gauge::new(
        "pl_pool_committed",
        "Principal of Funded loans"
    ).expect("metric creation failed");

    pub static ref POOL_ESCROWED_COLLATERAL: Gauge = Gauge::new(
        "pl_pool_escrowed_collateral",
        "Collateral held for Requested and Funded loans"
    ).expect("metric creation failed");

    // =========================================================================
    // LOANS
    // =========================================================================

    /// Lifecycle events by kind (requested/funded/repaid/loan_cancelled/defaulted)
    pub static ref LOAN_EVENTS: CounterVec = CounterVec::new(
        Opts::new("pl_loan_events_total", "Loan lifecycle events by kind"),
        &["kind"]
    ).expect("metric creation failed");

    pub static ref ACTIVE_LOANS: Gauge = Gauge::new(
        "pl_loans_active",
        "Loans in Requested or Funded"
    ).expect("metric creation failed");

    pub static ref OVERDUE_LOANS: Gauge = Gauge::new(
        "pl_loans_overdue",
        "Funded loans past their repayment deadline"
    ).expect("metric creation failed");

    /// Principal not covered by seized collateral, summed over liquidations
    pub static ref LIQUIDATION_SHORTFALL: Counter = Counter::new(
        "pl_liquidation_shortfall_total",
        "Principal written off beyond the seized collateral"
    ).expect("metric creation failed");

    // =========================================================================
    // ENGINE
    // =========================================================================

    pub static ref ENGINE_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("pl_engine_rejections_total", "Refused engine calls by operation and error kind"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    pub static ref ENGINE_HALTED: Gauge = Gauge::new(
        "pl_engine_halted",
        "1 once a ledger consistency fault has halted the engine"
    ).expect("metric creation failed");

    pub static ref AUDIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pl_engine_audit_duration_seconds",
            "Time spent in a full ledger audit"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Events skipped by a subscriber that fell behind
    pub static ref EVENTS_LAGGED: Counter = Counter::new(
        "pl_events_lagged_total",
        "Events dropped by lagging subscribers"
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Pool
        Box::new(POOL_DEPOSITS.clone()),
        Box::new(POOL_TRACKED_BALANCE.clone()),
        Box::new(POOL_AVAILABLE_BALANCE.clone()),
        Box::new(POOL_COMMITTED.clone()),
        Box::new(POOL_ESCROWED_COLLATERAL.clone()),
        // Loans
        Box::new(LOAN_EVENTS.clone()),
        Box::new(ACTIVE_LOANS.clone()),
        Box::new(OVERDUE_LOANS.clone()),
        Box::new(LIQUIDATION_SHORTFALL.clone()),
        // Engine
        Box::new(ENGINE_REJECTIONS.clone()),
        Box::new(ENGINE_HALTED.clone()),
        Box::new(AUDIT_DURATION.clone()),
        Box::new(EVENTS_LAGGED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Ledger amounts are u128; Prometheus samples are f64.
pub fn amount_sample(amount: u128) -> f64 {
    amount as f64
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
