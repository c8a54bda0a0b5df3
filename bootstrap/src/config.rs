//! Bootstrap configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use chainload_types::{NetworkId, NetworkParams};

use crate::files::{ChainFiles, CHECKPOINTS_FILENAME};
use crate::logging::LogFormat;
use crate::BootstrapError;

/// Configuration for chain-state bootstrap.
///
/// Can be loaded from a TOML file via [`BootstrapConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Which chain the wallet follows.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Private directory holding the header store and validated-hash cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Checkpoint bundle. Defaults to `checkpoints.txt` in `data_dir`.
    #[serde(default)]
    pub checkpoints: Option<PathBuf>,

    /// Checkpoints are only applied while the chain head is below this height.
    #[serde(default = "default_checkpoint_height_threshold")]
    pub checkpoint_height_threshold: u32,

    /// Subtracted from the earliest key creation time before choosing a checkpoint.
    #[serde(default = "default_checkpoint_time_margin_secs")]
    pub checkpoint_time_margin_secs: u64,

    /// LMDB map size of the header store, in bytes.
    #[serde(default = "default_header_store_map_size")]
    pub header_store_map_size: usize,

    /// LMDB map size of the validated-hash cache, in bytes.
    #[serde(default = "default_valid_hash_map_size")]
    pub valid_hash_map_size: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Main
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chainload_data")
}

fn default_checkpoint_height_threshold() -> u32 {
    50_000
}

fn default_checkpoint_time_margin_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_header_store_map_size() -> usize {
    chainload_store_lmdb::DEFAULT_HEADER_MAP_SIZE
}

fn default_valid_hash_map_size() -> usize {
    chainload_store_lmdb::DEFAULT_VALID_HASH_MAP_SIZE
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl BootstrapConfig {
    /// Defaults for `network` with files under `data_dir`.
    pub fn for_dir(network: NetworkId, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            network,
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, BootstrapError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BootstrapError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, BootstrapError> {
        toml::from_str(s).map_err(|e| BootstrapError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, BootstrapError> {
        toml::to_string_pretty(self).map_err(|e| BootstrapError::Config(e.to_string()))
    }

    pub fn params(&self) -> NetworkParams {
        NetworkParams::for_network(self.network)
    }

    pub fn files(&self) -> ChainFiles {
        ChainFiles::in_dir(&self.data_dir)
    }

    pub fn checkpoints_path(&self) -> PathBuf {
        self.checkpoints
            .clone()
            .unwrap_or_else(|| self.data_dir.join(CHECKPOINTS_FILENAME))
    }

    /// The configured log format; anything unrecognised falls back to human.
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.log_format).unwrap_or(LogFormat::Human)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            checkpoints: None,
            checkpoint_height_threshold: default_checkpoint_height_threshold(),
            checkpoint_time_margin_secs: default_checkpoint_time_margin_secs(),
            header_store_map_size: default_header_store_map_size(),
            valid_hash_map_size: default_valid_hash_map_size(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
