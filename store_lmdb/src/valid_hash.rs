//! LMDB implementation of ValidHashStore.

use std::path::Path;

use heed::types::Bytes;
use heed::Database;

use chainload_store::{StoreError, ValidHashStore};
use chainload_types::BlockHash;

use crate::environment::{env_file_exists, remove_env_files, LmdbEnvironment};
use crate::integrity::check_integrity;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::LmdbError;

const VALID_HASHES_DB: &str = "valid_hashes";
const META_DB: &str = "meta";
const MAX_DBS: u32 = 4;
const EMPTY_VALUE: &[u8] = &[];

/// Default memory map size for the validated-hash cache.
pub const DEFAULT_VALID_HASH_MAP_SIZE: usize = 32 * 1024 * 1024;

/// Set of block hashes that passed full validation, one key per hash.
pub struct LmdbValidHashCache {
    env: LmdbEnvironment,
    hashes_db: Database<Bytes, Bytes>,
    _meta: LmdbMetaStore,
}

impl LmdbValidHashCache {
    /// Open or create the cache at `path`. Same discipline as the header
    /// store: an existing file that fails to open or probe is deleted and
    /// reported as [`StoreError::Corruption`].
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        let first_run = !env_file_exists(path);
        match Self::open_and_probe(path, map_size) {
            Ok((cache, entries)) => {
                tracing::info!(path = %path.display(), first_run, entries, "validated-hash cache opened");
                Ok(cache)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "validated-hash cache cannot be opened, deleting it");
                if let Err(io) = remove_env_files(path) {
                    tracing::error!(path = %path.display(), error = %io, "failed to delete corrupt validated-hash cache");
                }
                Err(StoreError::Corruption(format!("validated-hash cache: {e}")))
            }
        }
    }

    fn open_and_probe(path: &Path, map_size: usize) -> Result<(Self, u64), LmdbError> {
        let env = LmdbEnvironment::open(path, MAX_DBS, map_size)?;
        let hashes_db = env.create_database(VALID_HASHES_DB)?;
        let meta = LmdbMetaStore::new(env.env().clone(), env.create_database(META_DB)?);

        Migrator::run(&meta)?;
        check_integrity(env.env(), &[VALID_HASHES_DB, META_DB])?.into_result()?;

        let entries = {
            let rtxn = env.env().read_txn()?;
            let mut entries = 0u64;
            for item in hashes_db.iter(&rtxn)? {
                let (key, _) = item?;
                if key.len() != 32 {
                    return Err(LmdbError::Integrity(format!(
                        "validated-hash key of {} bytes",
                        key.len()
                    )));
                }
                entries += 1;
            }
            entries
        };

        Ok((
            Self {
                env,
                hashes_db,
                _meta: meta,
            },
            entries,
        ))
    }

    pub fn path(&self) -> &Path {
        self.env.path()
    }

    fn lookup(&self, hash: &BlockHash) -> Result<bool, LmdbError> {
        let rtxn = self.env.env().read_txn()?;
        Ok(self.hashes_db.get(&rtxn, hash.as_bytes())?.is_some())
    }
}

impl ValidHashStore for LmdbValidHashCache {
    fn contains(&self, hash: &BlockHash) -> bool {
        match self.lookup(hash) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(hash = %hash, error = %e, "validated-hash lookup failed");
                false
            }
        }
    }

    fn insert(&self, hash: &BlockHash) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        self.hashes_db
            .put(&mut wtxn, hash.as_bytes(), EMPTY_VALUE)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn len(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let count = self.hashes_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
