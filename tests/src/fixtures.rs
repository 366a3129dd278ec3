//! Shared setup for tests and benches.

use lending_engine::{EngineConfig, InMemoryLedgerStore, LedgerStore, LendingEngine, ManualClock};
use shared_types::AccountId;
use std::sync::Arc;

pub const GENESIS: u64 = 1_700_000_000;

/// Deterministic account: `0x` followed by 20 copies of `tag`.
pub fn account(tag: u8) -> AccountId {
    AccountId::new([tag; 20])
}

/// Account from a 16-bit index, for large populations.
pub fn indexed_account(prefix: u8, index: u16) -> AccountId {
    let mut bytes = [0u8; 20];
    bytes[0] = prefix;
    bytes[18..].copy_from_slice(&index.to_be_bytes());
    AccountId::new(bytes)
}

pub struct TestEngine {
    pub engine: Arc<LendingEngine>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryLedgerStore>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = open(config, store.clone(), clock.clone());
        Self {
            engine,
            clock,
            store,
        }
    }

    /// A second engine over the same store and clock, as after a restart.
    pub fn reopen(&self) -> Arc<LendingEngine> {
        open(
            self.engine.config().clone(),
            self.store.clone(),
            self.clock.clone(),
        )
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn open(
    config: EngineConfig,
    store: Arc<dyn LedgerStore>,
    clock: Arc<ManualClock>,
) -> Arc<LendingEngine> {
    match LendingEngine::open(config, store, clock) {
        Ok(engine) => Arc::new(engine),
        Err(e) => panic!("test engine failed to open: {e}"),
    }
}
