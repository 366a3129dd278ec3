//! # File-Backed Ledger Store
//!
//! Durable store for deployments without RocksDB.
//!
//! ## Format
//!
//! ```text
//! [magic: 8 bytes "PLLEDG01"]
//! repeated: [table: u8][key: 20 bytes][value_len: u32 LE][value: bincode]
//! ```
//!
//! `table` is `b'C'` for contributions (value `u128`) and `b'L'` for loans
//! (value `LoanRecord`). Every commit rewrites the whole file through a temp
//! file, `fsync` and rename, so a crash leaves either the old or the new file.
//! A sibling `.lock` file holds an exclusive advisory lock for the lifetime of
//! the store.

use crate::domain::entities::LoanRecord;
use crate::domain::errors::StoreError;
use crate::ports::outbound::{LedgerBatch, LedgerSnapshot, LedgerStore};
use fs2::FileExt;
use parking_lot::Mutex;
use shared_types::{AccountId, Amount};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAGIC: &[u8; 8] = b"PLLEDG01";
const TABLE_CONTRIBUTIONS: u8 = b'C';
const TABLE_LOANS: u8 = b'L';

pub struct FileLedgerStore {
    path: PathBuf,
    state: Mutex<LedgerSnapshot>,
    // Held open to keep the advisory lock.
    _lock: File,
}

impl FileLedgerStore {
    /// Open (or create) the ledger file at `path`.
    ///
    /// Fails with `StoreError::Locked` if another process has it open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| StoreError::Locked {
            path: lock_path.display().to_string(),
        })?;

        let state = if path.exists() {
            let mut bytes = Vec::new();
            File::open(&path)?.read_to_end(&mut bytes)?;
            let snapshot = decode(&bytes)?;
            info!(
                path = %path.display(),
                lenders = snapshot.contributions.len(),
                loans = snapshot.loans.len(),
                "Loaded ledger file"
            );
            snapshot
        } else {
            info!(path = %path.display(), "No ledger file yet, starting empty");
            LedgerSnapshot::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        let bytes = encode(snapshot)?;
        let temp_path = self.path.with_extension("tmp");
        let written = File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(&bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), bytes = bytes.len(), "Ledger file written");
        Ok(())
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        Ok(self.state.lock().clone())
    }

    fn commit(&self, batch: &LedgerBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock();
        let mut next = state.clone();
        next.apply(batch);
        self.write_atomically(&next)?;
        *state = next;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

fn encode(snapshot: &LedgerSnapshot) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::with_capacity(64 * (snapshot.contributions.len() + snapshot.loans.len()));
    out.extend_from_slice(MAGIC);
    for (lender, amount) in &snapshot.contributions {
        push_record(&mut out, TABLE_CONTRIBUTIONS, lender, &bincode::serialize(amount)?)?;
    }
    for (borrower, loan) in &snapshot.loans {
        push_record(&mut out, TABLE_LOANS, borrower, &bincode::serialize(loan)?)?;
    }
    Ok(out)
}

fn push_record(
    out: &mut Vec<u8>,
    table: u8,
    key: &AccountId,
    value: &[u8],
) -> Result<(), StoreError> {
    let len = u32::try_from(value.len())
        .map_err(|_| StoreError::Serialization("record larger than 4 GiB".into()))?;
    out.push(table);
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(value);
    Ok(())
}

fn decode(bytes: &[u8]) -> Result<LedgerSnapshot, StoreError> {
    if bytes.is_empty() {
        return Ok(LedgerSnapshot::default());
    }
    let body = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| StoreError::Corrupt("missing ledger header".into()))?;

    let mut snapshot = LedgerSnapshot::default();
    let mut cursor = 0usize;
    while cursor < body.len() {
        let header_end = cursor + 1 + AccountId::LEN + 4;
        let header = body
            .get(cursor..header_end)
            .ok_or_else(|| StoreError::Corrupt(format!("truncated record at offset {cursor}")))?;
        let table = header[0];
        let key = AccountId::from_slice(&header[1..1 + AccountId::LEN])
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&header[1 + AccountId::LEN..]);
        let value_len = u32::from_le_bytes(len_bytes) as usize;

        let value = body
            .get(header_end..header_end + value_len)
            .ok_or_else(|| StoreError::Corrupt(format!("truncated value at offset {cursor}")))?;
        match table {
            TABLE_CONTRIBUTIONS => {
                let amount: Amount = bincode::deserialize(value)?;
                snapshot.contributions.insert(key, amount);
            }
            TABLE_LOANS => {
                let loan: LoanRecord = bincode::deserialize(value)?;
                if loan.borrower != key {
                    return Err(StoreError::Corrupt(format!(
                        "loan keyed by {key} names borrower {}",
                        loan.borrower
                    )));
                }
                snapshot.loans.insert(key, loan);
            }
            other => {
                return Err(StoreError::Corrupt(format!("unknown table tag {other:#04x}")));
            }
        }
        cursor = header_end + value_len;
    }
    Ok(snapshot)
}
