//! Counts lifecycle events as they leave the engine.

use lending_engine::{LendingApi, LendingEngine};
use lending_telemetry::{amount_sample, log_loan_event, EVENTS_LAGGED, LIQUIDATION_SHORTFALL, LOAN_EVENTS};
use shared_bus::{DomainEvent, EventFilter, EventKind, EventSubscriber, Subscription};
use shared_types::LoanState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub struct EventMetricsHandler {
    engine: Arc<LendingEngine>,
    subscription: Subscription,
    lagged: u64,
}

impl EventMetricsHandler {
    /// Subscribes immediately, so no event published after this call is missed.
    pub fn new(engine: Arc<LendingEngine>) -> Self {
        let subscription = engine.event_bus().subscribe(EventFilter::all());
        Self {
            engine,
            subscription,
            lagged: 0,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Event metrics handler started");
        loop {
            tokio::select! {
                event = self.subscription.recv() => match event {
                    Some(event) => self.record(&event),
                    None => {
                        info!("Event bus closed, event metrics handler exiting");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    info!("Event metrics handler received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Update counters for one event.
    pub fn record(&mut self, event: &DomainEvent) {
        LOAN_EVENTS.with_label_values(&[event.kind.as_str()]).inc();

        let skipped = self.subscription.skipped();
        if skipped > self.lagged {
            EVENTS_LAGGED.inc_by((skipped - self.lagged) as f64);
            self.lagged = skipped;
        }

        if event.kind == EventKind::Defaulted {
            // The record may already be replaced by a newer request.
            let shortfall = self
                .engine
                .get_loan(event.borrower)
                .filter(|loan| {
                    loan.state == LoanState::Defaulted && loan.closed_at == Some(event.timestamp)
                })
                .and_then(|loan| loan.shortfall)
                .unwrap_or(0);
            if shortfall > 0 {
                LIQUIDATION_SHORTFALL.inc_by(amount_sample(shortfall));
            }
        }

        log_loan_event!(
            debug,
            "Domain event observed",
            event.borrower,
            kind = event.kind.as_str(),
            sequence = event.sequence,
            amount = event.amount
        );
    }
}
