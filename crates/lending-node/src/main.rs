//! # Lending Node
//!
//! Hosts the pooled lending engine.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from the environment
//! 2. Load configuration (`PL_CONFIG` file, then env overrides)
//! 3. Open the ledger store and rebuild the engine (a failed audit aborts startup)
//! 4. Spawn background handlers
//! 5. Wait for Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use lending_node::{NodeConfig, NodeRuntime};
use lending_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = NodeConfig::load().context("Failed to load node configuration")?;
    info!(
        backend = %config.storage.backend,
        data_dir = %config.storage.path.display(),
        "Configuration loaded"
    );

    let mut runtime = NodeRuntime::new(config).context("Failed to start the lending engine")?;
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
