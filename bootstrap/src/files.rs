//! Stable file layout inside the wallet's private data directory.

use std::io;
use std::path::{Path, PathBuf};

use chainload_store_lmdb::{env_file_exists, remove_env_files};

pub const HEADER_STORE_FILENAME: &str = "blockchain";
pub const VALID_HASH_FILENAME: &str = "validhashes";
pub const CHECKPOINTS_FILENAME: &str = "checkpoints.txt";

/// Paths of the persisted chain-state files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainFiles {
    pub header_store: PathBuf,
    pub valid_hashes: PathBuf,
}

impl ChainFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            header_store: dir.join(HEADER_STORE_FILENAME),
            valid_hashes: dir.join(VALID_HASH_FILENAME),
        }
    }

    /// `false` means the next bootstrap is a first run.
    pub fn header_store_exists(&self) -> bool {
        env_file_exists(&self.header_store)
    }

    pub fn valid_hashes_exists(&self) -> bool {
        env_file_exists(&self.valid_hashes)
    }

    /// Delete both stores. Handles on them must already be closed.
    pub fn remove_all(&self) -> io::Result<()> {
        remove_env_files(&self.header_store)?;
        remove_env_files(&self.valid_hashes)?;
        tracing::info!(
            header_store = %self.header_store.display(),
            valid_hashes = %self.valid_hashes.display(),
            "chain state files removed"
        );
        Ok(())
    }
}
