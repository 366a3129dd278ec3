//! # Lending Telemetry
//!
//! Logging and metrics for the lending node.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter and a pretty or JSON formatter
//! - **Metrics**: Prometheus counters and gauges in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lending_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PL_SERVICE_NAME` | `pool-lend` | Service name in logs |
//! | `PL_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` takes precedence) |
//! | `PL_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `PL_JSON_LOGS` | `false` | JSON lines instead of the pretty format |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    amount_sample, encode_metrics, register_metrics, ACTIVE_LOANS, AUDIT_DURATION,
    ENGINE_HALTED, ENGINE_REJECTIONS, EVENTS_LAGGED, LIQUIDATION_SHORTFALL, LOAN_EVENTS,
    OVERDUE_LOANS, POOL_AVAILABLE_BALANCE, POOL_COMMITTED, POOL_DEPOSITS,
    POOL_ESCROWED_COLLATERAL, POOL_TRACKED_BALANCE,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
