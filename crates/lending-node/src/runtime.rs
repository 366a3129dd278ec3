//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Build the container (store, engine, observer)
//! 2. Spawn the event metrics handler
//! 3. Spawn the liquidation watch and the ledger auditor
//!
//! Shutdown flips a watch channel and waits for every task to return.

use crate::container::NodeContainer;
use crate::handlers::{EventMetricsHandler, LedgerAuditor, LiquidationWatch};
use crate::{NodeConfig, NodeError};
use lending_engine::LendingEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long shutdown waits for handlers to return.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct NodeRuntime {
    container: NodeContainer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let container = NodeContainer::build(config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    /// Spawn the background handlers. Must run inside a Tokio runtime.
    pub fn start(&mut self) {
        let engine = self.engine();
        let node = &self.container.config.node;

        let events = EventMetricsHandler::new(Arc::clone(&engine));
        let liquidation = LiquidationWatch::new(
            Arc::clone(&engine),
            Duration::from_secs(node.liquidation_scan_interval_secs),
        );
        let auditor = LedgerAuditor::new(
            Arc::clone(&engine),
            Duration::from_secs(node.audit_interval_secs),
        );

        self.tasks.push((
            "event_metrics",
            tokio::spawn(events.run(self.shutdown_rx.clone())),
        ));
        self.tasks.push((
            "liquidation_watch",
            tokio::spawn(liquidation.run(self.shutdown_rx.clone())),
        ));
        self.tasks.push((
            "ledger_audit",
            tokio::spawn(auditor.run(self.shutdown_rx.clone())),
        ));

        info!(handlers = self.tasks.len(), "Lending node started");
    }

    pub fn engine(&self) -> Arc<LendingEngine> {
        Arc::clone(&self.container.engine)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.container.config
    }

    /// Signal every handler and wait for them to return.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            // No receivers left: every handler already returned.
            warn!("Shutdown signal had no receivers: {}", e);
        }

        for (name, handle) in self.tasks.drain(..) {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => info!(handler = name, "Handler stopped"),
                Ok(Err(e)) => error!(handler = name, error = %e, "Handler panicked"),
                Err(_) => warn!(handler = name, "Handler did not stop in time"),
            }
        }
        info!("Shutdown complete");
    }
}
