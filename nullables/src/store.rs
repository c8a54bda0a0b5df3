//! Nullable stores: thread-safe in-memory header store and hash cache.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chainload_store::{HeaderStore, StoreError, ValidHashStore};
use chainload_types::{BlockHash, NetworkParams, StoredHeader};

/// An in-memory header store for testing.
pub struct NullHeaderStore {
    headers: Mutex<HashMap<BlockHash, StoredHeader>>,
    head: Mutex<StoredHeader>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl NullHeaderStore {
    /// A store holding only `genesis`, which is also the head.
    pub fn new(genesis: StoredHeader) -> Self {
        let mut headers = HashMap::new();
        headers.insert(genesis.hash(), genesis);
        Self {
            headers: Mutex::new(headers),
            head: Mutex::new(genesis),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn for_network(params: &NetworkParams) -> Self {
        Self::new(params.genesis_stored())
    }

    /// Make every subsequent `put` and `set_chain_head` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful `put` and `set_chain_head` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl HeaderStore for NullHeaderStore {
    fn chain_head(&self) -> StoredHeader {
        *self.head.lock().unwrap()
    }

    fn set_chain_head(&self, head: &StoredHeader) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.head.lock().unwrap() = *head;
        Ok(())
    }

    fn get(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, StoreError> {
        Ok(self.headers.lock().unwrap().get(hash).copied())
    }

    fn put(&self, header: &StoredHeader) -> Result<(), StoreError> {
        self.check_writable()?;
        self.headers.lock().unwrap().insert(header.hash(), *header);
        Ok(())
    }

    fn header_count(&self) -> Result<u64, StoreError> {
        Ok(self.headers.lock().unwrap().len() as u64)
    }
}

/// An in-memory validated-hash cache for testing.
#[derive(Default)]
pub struct NullValidHashStore {
    hashes: Mutex<HashSet<BlockHash>>,
    unreadable: AtomicBool,
}

impl NullValidHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend whose reads fail: `contains` answers `false`.
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }
}

impl ValidHashStore for NullValidHashStore {
    fn contains(&self, hash: &BlockHash) -> bool {
        if self.unreadable.load(Ordering::SeqCst) {
            return false;
        }
        self.hashes.lock().unwrap().contains(hash)
    }

    fn insert(&self, hash: &BlockHash) -> Result<(), StoreError> {
        self.hashes.lock().unwrap().insert(*hash);
        Ok(())
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.hashes.lock().unwrap().len() as u64)
    }
}
