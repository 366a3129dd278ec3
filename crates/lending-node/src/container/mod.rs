//! # Node Container
//!
//! Builds the engine from a [`NodeConfig`]: opens the store, attaches the
//! metrics observer and hands out shared handles to the background tasks.

pub mod config;

pub use config::{ConfigError, NodeConfig, RuntimeConfig, StorageBackend, StorageConfig};

use crate::adapters::{open_store, MetricsObserver};
use crate::NodeError;
use lending_engine::{LendingEngine, SystemTimeSource};
use std::sync::Arc;
use tracing::info;

pub struct NodeContainer {
    pub config: NodeConfig,
    pub engine: Arc<LendingEngine>,
}

impl NodeContainer {
    pub fn build(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let store = open_store(&config.storage)?;
        let engine = LendingEngine::open(config.engine.clone(), store, Arc::new(SystemTimeSource))?
            .with_observer(Arc::new(MetricsObserver));

        info!(
            backend = %config.storage.backend,
            data_dir = %config.storage.path.display(),
            interest_rate = %config.engine.interest_rate_bps,
            window_secs = config.engine.repayment_window_secs,
            "Node container ready"
        );
        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }
}
