use chainload_store::StoreError;
use thiserror::Error;

use crate::chain::ChainConstructionError;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("header store was corrupt and has been deleted: {0}")]
    HeaderStoreCorrupt(StoreError),

    #[error("validated-hash cache was corrupt and has been deleted: {0}")]
    ValidHashCacheCorrupt(StoreError),

    #[error("chain construction failed: {0}")]
    ChainConstruction(#[from] ChainConstructionError),

    #[error("a bootstrap attempt is already in flight")]
    AlreadyRunning,

    #[error("bootstrap worker stopped without reporting an outcome")]
    WorkerLost,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BootstrapError {
    /// Whether a local file was found corrupt (and removed) during this attempt.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            BootstrapError::HeaderStoreCorrupt(_) | BootstrapError::ValidHashCacheCorrupt(_)
        )
    }
}
