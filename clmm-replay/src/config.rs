//! Configuration for the replay service: nested section structs loaded
//! from TOML and validated before use.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ReplayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct ReplayConfig {
    pub ingest: IngestConfig,
    pub simulator: SimulatorConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestConfig {
    /// Reads newline-delimited JSON event records from a file.
    JsonLines { path: PathBuf },
    /// Fed from an in-process channel; used by tests and embedders.
    Channel,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig::JsonLines { path: "./data/events.jsonl".into() }
    }
}

/// One well-known pool's metadata, seeded statically until a real
/// metadata-indexing service exists.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PoolConfigEntry {
    pub token0: String,
    pub token1: String,
    #[validate(range(min = 1, max = 1_000_000))]
    pub fee_pips: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct SimulatorConfig {
    pub skip_pools: Vec<String>,
    pub pool_metadata: HashMap<String, PoolConfigEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    pub rocksdb_path: PathBuf,
    #[validate(range(min = 1, max = 3600))]
    pub flush_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            rocksdb_path: "./data/rocksdb".into(),
            flush_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    pub bind_address: String,
    pub enable_cors: bool,
    #[validate(range(min = 5, max = 300))]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            enable_cors: true,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitoringConfig {
    #[validate(range(min = 1024, max = 65535))]
    pub metrics_port: u16,
    pub log_level: String,
    pub structured_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            log_level: "info".to_string(),
            structured_logging: true,
        }
    }
}

impl ReplayConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReplayError::Configuration(format!("reading {path}: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ReplayError::Configuration(format!("parsing {path}: {e}")))?;
        config.validate_config()?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.rocksdb_path)
            .map_err(|e| ReplayError::Configuration(e.to_string()))?;
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.validate()
            .map_err(|e| ReplayError::Configuration(e.to_string()))?;
        if let IngestConfig::JsonLines { path } = &self.ingest {
            if path.as_os_str().is_empty() {
                return Err(ReplayError::Configuration("ingest.path cannot be empty".into()));
            }
        }
        Ok(())
    }
}
