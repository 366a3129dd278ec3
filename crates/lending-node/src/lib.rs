//! # Lending Node Library
//!
//! Exposes the node's building blocks for tests. The entry point is the
//! `main.rs` binary.
//!
//! ## Structure
//!
//! - `container/` - Configuration and engine construction
//! - `adapters/` - Ledger store selection (memory, file, RocksDB) and the metrics observer
//! - `handlers/` - Background tasks: event metrics, liquidation watch, ledger audit
//! - `runtime` - Spawns the handlers and coordinates shutdown

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{NodeConfig, NodeContainer};
pub use runtime::NodeRuntime;

use lending_engine::{EngineError, StoreError};
use lending_telemetry::TelemetryError;
use thiserror::Error;

/// Startup failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] container::ConfigError),

    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}
