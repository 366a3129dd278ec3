//! # Node Configuration
//!
//! One TOML file plus environment overrides.
//!
//! ```toml
//! [engine]
//! interest_rate_bps = 600
//! repayment_window_secs = 60
//!
//! [storage]
//! backend = "file"        # memory | file | rocksdb
//! path = "./data"
//!
//! [node]
//! audit_interval_secs = 30
//! liquidation_scan_interval_secs = 5
//! ```
//!
//! Every section and key is optional.

use lending_engine::{EngineConfig, EngineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Config file path.
pub const ENV_CONFIG: &str = "PL_CONFIG";
/// Overrides `storage.path`.
pub const ENV_DATA_DIR: &str = "PL_DATA_DIR";
/// Overrides `storage.backend`.
pub const ENV_STORAGE_BACKEND: &str = "PL_STORAGE_BACKEND";
/// Overrides `engine.repayment_window_secs`.
pub const ENV_REPAYMENT_WINDOW: &str = "PL_REPAYMENT_WINDOW_SECS";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub engine: EngineConfig,
    pub storage: StorageConfig,
    pub node: RuntimeConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Storage backend {0} is not compiled into this build (enable the `{0}` feature)")]
    BackendUnavailable(StorageBackend),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl NodeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// File named by `PL_CONFIG` (defaults otherwise), then env overrides, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) over an arbitrary environment lookup.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_CONFIG) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.path = PathBuf::from(dir);
        }
        if let Some(backend) = lookup(ENV_STORAGE_BACKEND) {
            self.storage.backend = backend.parse()?;
        }
        if let Some(window) = lookup(ENV_REPAYMENT_WINDOW) {
            self.engine.repayment_window_secs =
                window.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_REPAYMENT_WINDOW,
                    value: window.clone(),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.node.audit_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "node.audit_interval_secs",
                value: "0".into(),
            });
        }
        if self.node.liquidation_scan_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "node.liquidation_scan_interval_secs",
                value: "0".into(),
            });
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable(StorageBackend::RocksDb));
        }
        Ok(())
    }
}

/// Where the ledger lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile; everything is lost on exit.
    Memory,
    #[default]
    File,
    RocksDb,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::File => "file",
            StorageBackend::RocksDb => "rocksdb",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_STORAGE_BACKEND,
                value: s.to_string(),
            }),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory. The file backend writes `ledger.bin` here, RocksDB uses `rocksdb/`.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    pub fn ledger_file(&self) -> PathBuf {
        self.path.join("ledger.bin")
    }

    pub fn rocksdb_dir(&self) -> PathBuf {
        self.path.join("rocksdb")
    }
}

/// Background task cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub audit_interval_secs: u64,
    pub liquidation_scan_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            audit_interval_secs: 30,
            liquidation_scan_interval_secs: 5,
        }
    }
}
