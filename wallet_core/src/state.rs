//! Wallet collaborator trait.

use chainload_types::{BlockHash, Timestamp};

/// Last-seen height of a wallet that has not synced against any chain.
pub const UNKNOWN_BLOCK_HEIGHT: i64 = -1;

/// The wallet operations the bootstrap pipeline relies on.
///
/// Implementations use interior mutability: the wallet is shared between the
/// application and the bootstrap worker.
pub trait WalletState: Send + Sync {
    /// Drop every transaction confirmed at or above `from_height`, and all
    /// unconfirmed ones. `0` clears the whole history.
    fn clear_transactions(&self, from_height: u32);

    fn set_last_seen_block_height(&self, height: i64);

    fn set_last_seen_block_hash(&self, hash: Option<BlockHash>);

    /// Creation time of the oldest key; nothing before it can concern the wallet.
    fn earliest_key_creation_time(&self) -> Timestamp;

    fn last_seen_block_height(&self) -> i64;

    fn last_seen_block_hash(&self) -> Option<BlockHash>;
}
