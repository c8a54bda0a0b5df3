#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chainload_bootstrap::{BootstrapConfig, ChainFiles, HeaderChainConstructor, Orchestrator};
use chainload_checkpoints::{CheckpointSet, CheckpointSource, EmbeddedSource};
use chainload_nullables::NullWallet;
use chainload_store::HeaderStore;
use chainload_store_lmdb::LmdbHeaderStore;
use chainload_types::{BlockHash, BlockHeader, NetworkId, NetworkParams, StoredHeader, Timestamp};

pub const MAP_SIZE: usize = 4 * 1024 * 1024;

/// Earliest key time used by most tests: well after every sample checkpoint.
pub const KEY_TIME: u64 = 1_400_000_000;

pub fn config(dir: &Path) -> BootstrapConfig {
    let mut config = BootstrapConfig::for_dir(NetworkId::Regtest, dir);
    config.header_store_map_size = MAP_SIZE;
    config.valid_hash_map_size = MAP_SIZE;
    config
}

pub fn params() -> NetworkParams {
    NetworkParams::for_network(NetworkId::Regtest)
}

pub fn stored_at(height: u32, time: u32) -> StoredHeader {
    let header = BlockHeader {
        version: 4,
        prev_block: BlockHash::new([(height % 256) as u8; 32]),
        merkle_root: [0x77; 32],
        time,
        bits: 0x207fffff,
        nonce: height,
    };
    StoredHeader::new(header, height, u128::from(height) * 2)
}

/// Checkpoints at 20160, 40320 and 60480, a week of block time apart.
pub fn sample_checkpoints() -> CheckpointSet {
    CheckpointSet::from_headers(vec![
        stored_at(20_160, 1_300_000_000),
        stored_at(40_320, 1_310_000_000),
        stored_at(60_480, 1_320_000_000),
    ])
    .expect("valid checkpoints")
}

pub fn bundle_bytes(set: &CheckpointSet) -> Vec<u8> {
    let mut out = Vec::new();
    set.write_text(&mut out).expect("write bundle");
    out
}

/// Checkpoint source that counts how often it is opened.
pub struct CountingSource {
    inner: EmbeddedSource,
    opens: AtomicUsize,
}

impl CountingSource {
    pub fn new(set: &CheckpointSet) -> Arc<Self> {
        Arc::new(Self {
            inner: EmbeddedSource::new(bundle_bytes(set)),
            opens: AtomicUsize::new(0),
        })
    }

    pub fn garbage() -> Arc<Self> {
        Arc::new(Self {
            inner: EmbeddedSource::new(b"not a checkpoint bundle\n".to_vec()),
            opens: AtomicUsize::new(0),
        })
    }

    pub fn raw(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            inner: EmbeddedSource::new(bytes.to_vec()),
            opens: AtomicUsize::new(0),
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl CheckpointSource for CountingSource {
    fn describe(&self) -> String {
        "counting test source".to_string()
    }

    fn open(&self) -> std::io::Result<Box<dyn std::io::BufRead + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open()
    }
}

pub fn orchestrator(dir: &Path, source: Arc<CountingSource>) -> Orchestrator<HeaderChainConstructor> {
    Orchestrator::new(&config(dir), HeaderChainConstructor).with_checkpoint_source(source)
}

pub fn wallet() -> Arc<NullWallet> {
    Arc::new(NullWallet::new(Timestamp::new(KEY_TIME)).with_history(
        vec![100, 200, 300],
        300,
        Some(BlockHash::new([0x99; 32])),
    ))
}

/// Create a header store whose head sits at `height`.
pub fn seed_store_at(files: &ChainFiles, height: u32) -> StoredHeader {
    let store = LmdbHeaderStore::open(&files.header_store, &params(), MAP_SIZE).expect("open store");
    let head = stored_at(height, 1_350_000_000);
    store.put(&head).expect("put head");
    store.set_chain_head(&head).expect("set head");
    head
}
