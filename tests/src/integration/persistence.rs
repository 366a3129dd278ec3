//! # Persistence and Restart
//!
//! Derived balances (reserved, committed, escrowed) are never stored; they
//! must come back identical from the two persisted tables.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, TestEngine, GENESIS};
    use lending_engine::{
        EngineConfig, EngineError, FileLedgerStore, LedgerStore, LendingApi, LendingEngine,
        ManualClock, StoreError,
    };
    use lending_node::container::{StorageBackend, StorageConfig};
    use lending_node::{NodeConfig, NodeContainer};
    use shared_types::LoanState;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_file_engine(path: &Path, clock: Arc<ManualClock>) -> LendingEngine {
        let store: Arc<dyn LedgerStore> = Arc::new(FileLedgerStore::open(path).unwrap());
        LendingEngine::open(EngineConfig::default(), store, clock).unwrap()
    }

    #[test]
    fn test_restart_over_memory_store() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));
        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        t.engine.fund_loan(lender, borrower).unwrap();
        t.engine.request_loan(account(0x23), lender, 10, 1).unwrap();

        let reopened = t.reopen();
        assert_eq!(reopened.pool_snapshot(), t.engine.pool_snapshot());
        assert_eq!(reopened.lender_contribution(lender).reserved, 50);
        assert_eq!(reopened.active_loans().len(), 2);
    }

    #[test]
    fn test_restart_over_file_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.bin");
        let clock = Arc::new(ManualClock::new(GENESIS));
        let (lender, borrower) = (account(0x11), account(0x22));

        let before = {
            let engine = open_file_engine(&path, clock.clone());
            engine.deposit(lender, 100).unwrap();
            engine.request_loan(borrower, lender, 50, 5).unwrap();
            engine.fund_loan(lender, borrower).unwrap();
            engine.pool_snapshot()
        };

        let engine = open_file_engine(&path, clock.clone());
        assert_eq!(engine.pool_snapshot(), before);

        // The deadline survives the restart.
        clock.advance(61);
        let view = engine.liquidate_collateral(lender, borrower).unwrap();
        assert_eq!(view.state, LoanState::Defaulted);
    }

    #[test]
    fn test_recent_events_do_not_survive_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.bin");
        let clock = Arc::new(ManualClock::new(GENESIS));
        {
            let engine = open_file_engine(&path, clock.clone());
            engine.deposit(account(0x11), 100).unwrap();
            engine
                .request_loan(account(0x22), account(0x11), 50, 5)
                .unwrap();
            assert_eq!(engine.recent_events().len(), 1);
        }
        let engine = open_file_engine(&path, clock);
        assert!(engine.recent_events().is_empty());
        assert!(engine.get_loan(account(0x22)).is_some());
    }

    #[test]
    fn test_damaged_file_refuses_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.bin");
        {
            let engine = open_file_engine(&path, Arc::new(ManualClock::new(GENESIS)));
            engine.deposit(account(0x11), 100).unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

        assert!(matches!(
            FileLedgerStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_node_container_restart() {
        let dir = TempDir::new().unwrap();
        let config = NodeConfig {
            storage: StorageConfig {
                backend: StorageBackend::File,
                path: dir.path().to_path_buf(),
            },
            ..Default::default()
        };
        let lender = account(0x11);

        {
            let node = NodeContainer::build(config.clone()).unwrap();
            node.engine.deposit(lender, 500).unwrap();
            node.engine
                .request_loan(account(0x22), lender, 100, 10)
                .unwrap();
        }

        let node = NodeContainer::build(config).unwrap();
        assert_eq!(node.engine.pool_snapshot().tracked_balance, 500);
        assert_eq!(node.engine.pending_requests_for(lender).len(), 1);
        assert!(matches!(
            node.engine.request_loan(account(0x22), lender, 100, 10),
            Err(EngineError::DuplicateActiveLoan { .. })
        ));
    }
}
