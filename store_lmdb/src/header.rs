//! LMDB implementation of HeaderStore.
//!
//! Headers are bincode-encoded `StoredHeader`s keyed by their 32-byte hash.
//! The chain head pointer is a hash kept in the meta table and mirrored in
//! memory so `chain_head()` never touches the disk.

use std::path::Path;
use std::sync::RwLock;

use heed::types::Bytes;
use heed::Database;

use chainload_store::{HeaderStore, MetaStore, StoreError};
use chainload_types::{BlockHash, NetworkParams, StoredHeader};

use crate::environment::{env_file_exists, remove_env_files, LmdbEnvironment};
use crate::integrity::check_integrity;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::LmdbError;

const HEADERS_DB: &str = "headers";
const META_DB: &str = "meta";
const CHAIN_HEAD_KEY: &str = "chain_head";
const MAX_DBS: u32 = 4;

/// Default memory map size for the header store.
pub const DEFAULT_HEADER_MAP_SIZE: usize = 64 * 1024 * 1024;

pub struct LmdbHeaderStore {
    env: LmdbEnvironment,
    headers_db: Database<Bytes, Bytes>,
    meta: LmdbMetaStore,
    head: RwLock<StoredHeader>,
}

impl LmdbHeaderStore {
    /// Open or create the header store at `path` and probe its chain head.
    ///
    /// A missing file is a first run: the store is created with the network's
    /// genesis header as head. Any failure while opening or probing an
    /// existing file is corruption: the file is deleted before the error is
    /// returned.
    pub fn open(path: &Path, params: &NetworkParams, map_size: usize) -> Result<Self, StoreError> {
        let first_run = !env_file_exists(path);
        match Self::open_and_probe(path, params, map_size) {
            Ok(store) => {
                let head = store.chain_head();
                tracing::info!(
                    path = %path.display(),
                    first_run,
                    height = head.height,
                    head = %head.hash(),
                    "header store opened"
                );
                Ok(store)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "header store cannot be opened, deleting it");
                if let Err(io) = remove_env_files(path) {
                    tracing::error!(path = %path.display(), error = %io, "failed to delete corrupt header store");
                }
                Err(StoreError::Corruption(format!("header store: {e}")))
            }
        }
    }

    fn open_and_probe(
        path: &Path,
        params: &NetworkParams,
        map_size: usize,
    ) -> Result<Self, LmdbError> {
        let env = LmdbEnvironment::open(path, MAX_DBS, map_size)?;
        let headers_db = env.create_database(HEADERS_DB)?;
        let meta = LmdbMetaStore::new(env.env().clone(), env.create_database(META_DB)?);

        Migrator::run(&meta)?;
        check_integrity(env.env(), &[HEADERS_DB, META_DB])?.into_result()?;

        let head = probe_chain_head(&env, &headers_db, &meta, params)?;
        Ok(Self {
            env,
            headers_db,
            meta,
            head: RwLock::new(head),
        })
    }

    pub fn path(&self) -> &Path {
        self.env.path()
    }
}

/// Read the head pointer and the header it names, or initialise a fresh store.
fn probe_chain_head(
    env: &LmdbEnvironment,
    headers_db: &Database<Bytes, Bytes>,
    meta: &LmdbMetaStore,
    params: &NetworkParams,
) -> Result<StoredHeader, LmdbError> {
    let pointer = meta
        .get_meta(CHAIN_HEAD_KEY)
        .map_err(|e| LmdbError::Integrity(e.to_string()))?;

    let Some(pointer) = pointer else {
        let rtxn = env.env().read_txn()?;
        let count = headers_db.len(&rtxn)?;
        drop(rtxn);
        if count > 0 {
            return Err(LmdbError::Integrity(format!(
                "{count} headers stored but no chain head pointer"
            )));
        }
        let genesis = params.genesis_stored();
        let mut wtxn = env.env().write_txn()?;
        headers_db.put(&mut wtxn, hash_key(&genesis.hash()), &bincode::serialize(&genesis)?)?;
        meta.meta_db
            .put(&mut wtxn, CHAIN_HEAD_KEY.as_bytes(), hash_key(&genesis.hash()))?;
        wtxn.commit()?;
        return Ok(genesis);
    };

    let hash = BlockHash::from_slice(&pointer)
        .map_err(|e| LmdbError::Integrity(format!("chain head pointer: {e}")))?;
    let rtxn = env.env().read_txn()?;
    let raw = headers_db
        .get(&rtxn, hash_key(&hash))?
        .ok_or_else(|| LmdbError::Integrity(format!("chain head {hash} is not in the header index")))?;
    let stored: StoredHeader = bincode::deserialize(raw)
        .map_err(|e| LmdbError::Integrity(format!("chain head {hash} is undecodable: {e}")))?;
    if stored.hash() != hash {
        return Err(LmdbError::Integrity(format!(
            "chain head record under {hash} hashes to {}",
            stored.hash()
        )));
    }
    Ok(stored)
}

fn hash_key(hash: &BlockHash) -> &[u8] {
    hash.as_bytes()
}

impl HeaderStore for LmdbHeaderStore {
    fn chain_head(&self) -> StoredHeader {
        *self.head.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_chain_head(&self, head: &StoredHeader) -> Result<(), StoreError> {
        self.meta.put_meta(CHAIN_HEAD_KEY, hash_key(&head.hash()))?;
        *self.head.write().unwrap_or_else(|e| e.into_inner()) = *head;
        Ok(())
    }

    fn get(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let raw = self
            .headers_db
            .get(&rtxn, hash_key(hash))
            .map_err(LmdbError::from)?;
        match raw {
            Some(bytes) => {
                let stored = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    fn put(&self, header: &StoredHeader) -> Result<(), StoreError> {
        let bytes = bincode::serialize(header).map_err(LmdbError::from)?;
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        self.headers_db
            .put(&mut wtxn, hash_key(&header.hash()), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn header_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let count = self.headers_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::lock_file_path;
    use chainload_types::{BlockHeader, NetworkId};

    const MAP_SIZE: usize = 4 * 1024 * 1024;

    fn params() -> NetworkParams {
        NetworkParams::for_network(NetworkId::Regtest)
    }

    fn next_header(parent: &StoredHeader, nonce: u32) -> StoredHeader {
        let header = BlockHeader {
            version: 1,
            prev_block: parent.hash(),
            merkle_root: [0x5a; 32],
            time: parent.header.time + 600,
            bits: 0x207fffff,
            nonce,
        };
        parent.child(header, 2)
    }

    #[test]
    fn fresh_store_starts_at_genesis() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("open");

        let head = store.chain_head();
        assert_eq!(head.height, 0);
        assert_eq!(head.hash(), params().genesis_hash());
        assert_eq!(store.header_count().unwrap(), 1);
        assert!(env_file_exists(&path));
    }

    #[test]
    fn head_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        let advanced = {
            let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("open");
            let next = next_header(&store.chain_head(), 1);
            store.put(&next).unwrap();
            store.set_chain_head(&next).unwrap();
            next
        };

        let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("reopen");
        assert_eq!(store.chain_head(), advanced);
        assert_eq!(store.get(&advanced.hash()).unwrap(), Some(advanced));
        assert_eq!(store.header_count().unwrap(), 2);
    }

    #[test]
    fn unknown_hash_is_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store =
            LmdbHeaderStore::open(&dir.path().join("blockchain"), &params(), MAP_SIZE).expect("open");
        assert!(store.get(&BlockHash::new([0xEE; 32])).unwrap().is_none());
    }

    #[test]
    fn garbage_file_is_corruption_and_is_deleted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        std::fs::write(&path, vec![0xAB; 3 * 4096]).unwrap();

        let err = LmdbHeaderStore::open(&path, &params(), MAP_SIZE)
            .err()
            .expect("garbage must not open");
        assert!(err.is_corruption());
        assert!(!path.exists());
        assert!(!lock_file_path(&path).exists());

        let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("second open is a first run");
        assert_eq!(store.chain_head().height, 0);
    }

    #[test]
    fn dangling_head_pointer_is_corruption() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        {
            let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("open");
            store
                .meta
                .put_meta(CHAIN_HEAD_KEY, &[0x42; 32])
                .unwrap();
        }

        let err = LmdbHeaderStore::open(&path, &params(), MAP_SIZE)
            .err()
            .expect("dangling head must not open");
        assert!(err.is_corruption());
        assert!(!path.exists());
    }

    #[test]
    fn newer_schema_is_corruption() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        {
            let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("open");
            store.meta.set_schema_version(99).unwrap();
        }

        assert!(LmdbHeaderStore::open(&path, &params(), MAP_SIZE).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_head_pointer_with_headers_is_corruption() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blockchain");
        {
            let store = LmdbHeaderStore::open(&path, &params(), MAP_SIZE).expect("open");
            let mut wtxn = store.env.env().write_txn().unwrap();
            store
                .meta
                .meta_db
                .delete(&mut wtxn, CHAIN_HEAD_KEY.as_bytes())
                .unwrap();
            wtxn.commit().unwrap();
        }

        assert!(LmdbHeaderStore::open(&path, &params(), MAP_SIZE).is_err());
        assert!(!path.exists());
    }
}
