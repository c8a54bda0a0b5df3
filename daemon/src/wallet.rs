//! A JSON-file wallet holding just the state the bootstrap pipeline touches.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use chainload_types::{BlockHash, Timestamp};
use chainload_wallet_core::{WalletState, UNKNOWN_BLOCK_HEIGHT};

pub const WALLET_FILENAME: &str = "wallet.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub txid: String,
    /// Confirmation height; `None` while unconfirmed.
    pub height: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct WalletFile {
    earliest_key_time: u64,
    #[serde(default = "unknown_height")]
    last_seen_block_height: i64,
    /// Display-order hex.
    #[serde(default)]
    last_seen_block_hash: Option<String>,
    #[serde(default)]
    transactions: Vec<TxRecord>,
}

fn unknown_height() -> i64 {
    UNKNOWN_BLOCK_HEIGHT
}

/// Wallet state persisted to a JSON file after every mutation.
pub struct FileWallet {
    path: PathBuf,
    state: Mutex<WalletFile>,
}

impl FileWallet {
    /// Load the wallet at `path`, creating one whose keys date from now when absent.
    pub fn open_or_create(path: &Path) -> anyhow::Result<Self> {
        let state = if path.is_file() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading wallet {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing wallet {}", path.display()))?
        } else {
            tracing::info!(path = %path.display(), "creating new wallet");
            WalletFile {
                earliest_key_time: Timestamp::now().as_secs(),
                last_seen_block_height: UNKNOWN_BLOCK_HEIGHT,
                last_seen_block_hash: None,
                transactions: Vec::new(),
            }
        };

        let wallet = Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        };
        wallet.save()?;
        Ok(wallet)
    }

    pub fn transactions(&self) -> Vec<TxRecord> {
        self.lock().transactions.clone()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&*self.lock())?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing wallet {}", self.path.display()))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WalletFile> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, f: impl FnOnce(&mut WalletFile)) {
        f(&mut self.lock());
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "failed to persist wallet");
        }
    }
}

impl WalletState for FileWallet {
    fn clear_transactions(&self, from_height: u32) {
        self.update(|w| {
            w.transactions
                .retain(|tx| tx.height.is_some_and(|h| h < from_height));
        });
    }

    fn set_last_seen_block_height(&self, height: i64) {
        self.update(|w| w.last_seen_block_height = height);
    }

    fn set_last_seen_block_hash(&self, hash: Option<BlockHash>) {
        self.update(|w| w.last_seen_block_hash = hash.map(|h| h.to_string()));
    }

    fn earliest_key_creation_time(&self) -> Timestamp {
        Timestamp::new(self.lock().earliest_key_time)
    }

    fn last_seen_block_height(&self) -> i64 {
        self.lock().last_seen_block_height
    }

    fn last_seen_block_hash(&self) -> Option<BlockHash> {
        let hex = self.lock().last_seen_block_hash.clone()?;
        match BlockHash::from_hex(&hex) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable last-seen block hash");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(path: &Path) {
        let json = r#"{
            "earliest_key_time": 1400000000,
            "last_seen_block_height": 300,
            "last_seen_block_hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
            "transactions": [
                { "txid": "aa", "height": 100 },
                { "txid": "bb", "height": 250 },
                { "txid": "cc", "height": null }
            ]
        }"#;
        std::fs::write(path, json).unwrap();
    }

    #[test]
    fn new_wallet_is_unsynced_and_saved() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(WALLET_FILENAME);
        let wallet = FileWallet::open_or_create(&path).unwrap();
        assert_eq!(wallet.last_seen_block_height(), UNKNOWN_BLOCK_HEIGHT);
        assert!(path.is_file());
    }

    #[test]
    fn partial_clear_keeps_older_confirmed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(WALLET_FILENAME);
        seeded(&path);

        let wallet = FileWallet::open_or_create(&path).unwrap();
        assert!(wallet.last_seen_block_hash().is_some());
        wallet.clear_transactions(200);
        let txids: Vec<_> = wallet.transactions().into_iter().map(|t| t.txid).collect();
        assert_eq!(txids, vec!["aa"]);
    }

    #[test]
    fn reset_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(WALLET_FILENAME);
        seeded(&path);
        {
            let wallet = FileWallet::open_or_create(&path).unwrap();
            chainload_wallet_core::reset_wallet(&wallet);
        }

        let wallet = FileWallet::open_or_create(&path).unwrap();
        assert!(wallet.transactions().is_empty());
        assert_eq!(wallet.last_seen_block_height(), UNKNOWN_BLOCK_HEIGHT);
        assert!(wallet.last_seen_block_hash().is_none());
        assert_eq!(wallet.earliest_key_creation_time(), Timestamp::new(1_400_000_000));
    }
}
