//! # RocksDB Ledger Store
//!
//! Production [`LedgerStore`] on RocksDB.
//!
//! ## Column Families
//!
//! - `contributions` - lender address (20 bytes) → bincode `u128`
//! - `loans` - borrower address (20 bytes) → bincode `LoanRecord`
//!
//! A commit is one `WriteBatch` across both families, so it lands whole or
//! not at all.

use lending_engine::{LedgerBatch, LedgerSnapshot, LedgerStore, LoanRecord, StoreError};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use shared_types::{AccountId, Amount};
use std::path::PathBuf;
use tracing::info;

pub const CF_CONTRIBUTIONS: &str = "contributions";
pub const CF_LOANS: &str = "loans";

pub const COLUMN_FAMILIES: &[&str] = &[CF_CONTRIBUTIONS, CF_LOANS];

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// fsync every commit (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/rocksdb"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbLedgerStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbLedgerStore {
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            StoreError::Io {
                message: format!("Failed to open RocksDB at {}: {e}", config.path.display()),
            }
        })?;
        info!(path = %config.path.display(), "RocksDB ledger opened");

        Ok(Self { db, config })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Corrupt(format!("missing column family {name}")))
    }

    fn scan<V: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Vec<(AccountId, V)>, StoreError> {
        let cf = self.cf(name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StoreError::Io {
                message: format!("RocksDB scan of {name} failed: {e}"),
            })?;
            let account = AccountId::from_slice(&key)
                .map_err(|e| StoreError::Corrupt(format!("bad key in {name}: {e}")))?;
            rows.push((account, bincode::deserialize(&value)?));
        }
        Ok(rows)
    }
}

impl LedgerStore for RocksDbLedgerStore {
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        let mut snapshot = LedgerSnapshot::default();
        for (lender, amount) in self.scan::<Amount>(CF_CONTRIBUTIONS)? {
            snapshot.contributions.insert(lender, amount);
        }
        for (borrower, loan) in self.scan::<LoanRecord>(CF_LOANS)? {
            snapshot.loans.insert(borrower, loan);
        }
        Ok(snapshot)
    }

    fn commit(&self, batch: &LedgerBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let contributions = self.cf(CF_CONTRIBUTIONS)?;
        let loans = self.cf(CF_LOANS)?;

        let mut write = WriteBatch::default();
        for (lender, amount) in &batch.contributions {
            write.put_cf(contributions, lender.as_bytes(), bincode::serialize(amount)?);
        }
        for loan in &batch.loans {
            write.put_cf(loans, loan.borrower.as_bytes(), bincode::serialize(loan)?);
        }

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .write_opt(write, &write_opts)
            .map_err(|e| StoreError::Io {
                message: format!("RocksDB batch write failed: {e}"),
            })
    }

    fn backend(&self) -> &'static str {
        "rocksdb"
    }
}
