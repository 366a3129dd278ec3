//! Periodic full audit of the ledger. Feeds the pool gauges.

use lending_engine::{AuditReport, EngineError, LendingApi, LendingEngine};
use lending_telemetry::{
    amount_sample, time_histogram, ACTIVE_LOANS, AUDIT_DURATION, ENGINE_HALTED,
    POOL_AVAILABLE_BALANCE, POOL_COMMITTED, POOL_ESCROWED_COLLATERAL, POOL_TRACKED_BALANCE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct LedgerAuditor {
    engine: Arc<LendingEngine>,
    interval: Duration,
    halt_reported: bool,
}

impl LedgerAuditor {
    pub fn new(engine: Arc<LendingEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            halt_reported: false,
        }
    }

    pub fn run_once(&mut self) -> Result<AuditReport, EngineError> {
        let result = {
            let _timer = time_histogram!(AUDIT_DURATION);
            self.engine.audit()
        };

        match &result {
            Ok(report) => {
                POOL_TRACKED_BALANCE.set(amount_sample(report.tracked_balance));
                POOL_COMMITTED.set(amount_sample(report.committed));
                POOL_AVAILABLE_BALANCE.set(amount_sample(
                    report.tracked_balance.saturating_sub(report.committed),
                ));
                POOL_ESCROWED_COLLATERAL.set(amount_sample(report.escrowed_collateral));
                ACTIVE_LOANS.set(report.active_loans as f64);
                ENGINE_HALTED.set(0.0);
                debug!(
                    tracked = report.tracked_balance,
                    committed = report.committed,
                    escrowed = report.escrowed_collateral,
                    active = report.active_loans,
                    "Ledger audit passed"
                );
            }
            Err(EngineError::Halted) => {
                ENGINE_HALTED.set(1.0);
                if !self.halt_reported {
                    error!("Engine is halted; mutations refused until an operator restarts it");
                    self.halt_reported = true;
                }
            }
            Err(e) => {
                if e.is_fatal() {
                    ENGINE_HALTED.set(1.0);
                }
                error!(error = %e, "Ledger audit failed");
            }
        }
        result
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Ledger auditor started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.run_once();
                }
                _ = shutdown.changed() => {
                    info!("Ledger auditor received shutdown signal");
                    break;
                }
            }
        }
    }
}
