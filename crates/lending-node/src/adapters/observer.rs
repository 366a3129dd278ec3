//! Engine outcomes into Prometheus counters.

use lending_engine::{EngineError, EngineObserver};
use lending_telemetry::{metric_inc, ENGINE_HALTED, ENGINE_REJECTIONS, POOL_DEPOSITS};

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl EngineObserver for MetricsObserver {
    fn completed(&self, operation: &'static str) {
        if operation == "deposit" {
            metric_inc!(POOL_DEPOSITS);
        }
    }

    fn rejected(&self, operation: &'static str, error: &EngineError) {
        metric_inc!(ENGINE_REJECTIONS, &[operation, error.kind()]);
        if error.is_fatal() {
            ENGINE_HALTED.set(1.0);
        }
    }
}
