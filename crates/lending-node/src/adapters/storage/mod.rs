//! # Ledger Storage Backends
//!
//! Picks the [`LedgerStore`] named by `[storage] backend`.
//!
//! | Backend | Adapter | Durability |
//! |---------|---------|------------|
//! | `memory` | `InMemoryLedgerStore` | none |
//! | `file` | `FileLedgerStore` | fsync + rename per commit |
//! | `rocksdb` | `RocksDbLedgerStore` | WAL + `WriteBatch` (feature `rocksdb`) |

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbConfig, RocksDbLedgerStore, CF_CONTRIBUTIONS, CF_LOANS, COLUMN_FAMILIES,
};

use crate::container::config::{StorageBackend, StorageConfig};
use crate::NodeError;
use lending_engine::{FileLedgerStore, InMemoryLedgerStore, LedgerStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Open the configured ledger store.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn LedgerStore>, NodeError> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory ledger; state is lost on exit");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        StorageBackend::File => {
            let path = config.ledger_file();
            info!(path = %path.display(), "Opening file ledger");
            Ok(Arc::new(FileLedgerStore::open(path)?))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            let rocks = RocksDbConfig {
                path: config.rocksdb_dir(),
                ..Default::default()
            };
            Ok(Arc::new(RocksDbLedgerStore::open(rocks)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(crate::container::config::ConfigError::BackendUnavailable(
            StorageBackend::RocksDb,
        )
        .into()),
    }
}
