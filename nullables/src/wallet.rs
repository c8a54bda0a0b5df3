//! Nullable wallet: in-memory chain-derived wallet state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chainload_types::{BlockHash, Timestamp};
use chainload_wallet_core::{WalletState, UNKNOWN_BLOCK_HEIGHT};

type Hook = Box<dyn Fn() + Send + Sync>;

/// Observable wallet state, comparable across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub transaction_heights: Vec<u32>,
    pub last_seen_height: i64,
    pub last_seen_hash: Option<BlockHash>,
}

/// An in-memory wallet for testing.
pub struct NullWallet {
    state: Mutex<WalletSnapshot>,
    earliest_key_time: Timestamp,
    clear_calls: AtomicUsize,
    on_clear: Mutex<Option<Hook>>,
}

impl NullWallet {
    /// A wallet with no history whose oldest key was created at `earliest_key_time`.
    pub fn new(earliest_key_time: Timestamp) -> Self {
        Self {
            state: Mutex::new(WalletSnapshot {
                transaction_heights: Vec::new(),
                last_seen_height: UNKNOWN_BLOCK_HEIGHT,
                last_seen_hash: None,
            }),
            earliest_key_time,
            clear_calls: AtomicUsize::new(0),
            on_clear: Mutex::new(None),
        }
    }

    /// Seed transactions (by confirmation height) and the last-seen pointer.
    pub fn with_history(
        self,
        transaction_heights: Vec<u32>,
        last_seen_height: i64,
        last_seen_hash: Option<BlockHash>,
    ) -> Self {
        *self.state.lock().unwrap() = WalletSnapshot {
            transaction_heights,
            last_seen_height,
            last_seen_hash,
        };
        self
    }

    /// Run `hook` every time transactions are cleared.
    pub fn on_clear(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_clear.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.state.lock().unwrap().clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transaction_heights.len()
    }

    /// Number of `clear_transactions` calls so far.
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl WalletState for NullWallet {
    fn clear_transactions(&self, from_height: u32) {
        self.state
            .lock()
            .unwrap()
            .transaction_heights
            .retain(|&h| h < from_height);
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.on_clear.lock().unwrap().as_ref() {
            hook();
        }
    }

    fn set_last_seen_block_height(&self, height: i64) {
        self.state.lock().unwrap().last_seen_height = height;
    }

    fn set_last_seen_block_hash(&self, hash: Option<BlockHash>) {
        self.state.lock().unwrap().last_seen_hash = hash;
    }

    fn earliest_key_creation_time(&self) -> Timestamp {
        self.earliest_key_time
    }

    fn last_seen_block_height(&self) -> i64 {
        self.state.lock().unwrap().last_seen_height
    }

    fn last_seen_block_hash(&self) -> Option<BlockHash> {
        self.state.lock().unwrap().last_seen_hash
    }
}
