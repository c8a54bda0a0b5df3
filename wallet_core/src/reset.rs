//! Wallet reset policy.
//!
//! Without a header store the wallet's idea of "where the chain is" refers to
//! a chain that no longer exists locally. The wallet is rewound to an unsynced
//! state so it rescans from the rebuilt store.

use crate::state::{WalletState, UNKNOWN_BLOCK_HEIGHT};

/// Whether the wallet must be rewound before bootstrap touches any store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetDecision {
    Reset,
    Keep,
}

impl ResetDecision {
    pub fn is_reset(&self) -> bool {
        matches!(self, ResetDecision::Reset)
    }

    /// Carry out the decision against `wallet`. `Keep` leaves it untouched.
    pub fn apply(self, wallet: &dyn WalletState) {
        match self {
            ResetDecision::Reset => reset_wallet(wallet),
            ResetDecision::Keep => {}
        }
    }
}

pub struct WalletResetPolicy;

impl WalletResetPolicy {
    pub fn decide(header_store_exists: bool) -> ResetDecision {
        if header_store_exists {
            ResetDecision::Keep
        } else {
            ResetDecision::Reset
        }
    }
}

/// Clear all transactions and forget the last-seen block.
pub fn reset_wallet(wallet: &dyn WalletState) {
    tracing::info!(
        last_seen_height = wallet.last_seen_block_height(),
        "blockchain does not exist, resetting wallet"
    );
    wallet.clear_transactions(0);
    wallet.set_last_seen_block_height(UNKNOWN_BLOCK_HEIGHT);
    wallet.set_last_seen_block_hash(None);
}
