//! Structured logging setup.
//!
//! Every line carries the target, level and structured fields. In JSON mode
//! the output is one object per line, ready for a log shipper.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(format!("bad log filter {:?}: {e}", config.log_level)))
}

/// Install the global subscriber.
///
/// Fails with [`TelemetryError::LoggingInit`] if a subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let json_layer = (config.console_output && config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let pretty_layer = (config.console_output && !config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        level = %config.log_level,
        "Logging initialized"
    );
    Ok(())
}

/// Log a loan lifecycle event with the standard fields.
#[macro_export]
macro_rules! log_loan_event {
    ($level:ident, $msg:expr, $borrower:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            borrower = %$borrower,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a lender-side event with the standard fields.
#[macro_export]
macro_rules! log_lender_event {
    ($level:ident, $msg:expr, $lender:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            lender = %$lender,
            $($($field)*,)?
            $msg
        )
    };
}
