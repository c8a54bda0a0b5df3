use proptest::prelude::*;

use chainload_nullables::NullWallet;
use chainload_types::{BlockHash, Timestamp};
use chainload_wallet_core::{reset_wallet, WalletResetPolicy, WalletState, UNKNOWN_BLOCK_HEIGHT};

fn wallet_with_history(heights: &[u32], last_seen: i64, hash: Option<[u8; 32]>) -> NullWallet {
    NullWallet::new(Timestamp::new(1_400_000_000)).with_history(
        heights.to_vec(),
        last_seen,
        hash.map(BlockHash::new),
    )
}

proptest! {
    /// Resetting twice leaves the wallet exactly as resetting once.
    #[test]
    fn reset_is_idempotent(
        heights in prop::collection::vec(0u32..800_000, 0..50),
        last_seen in -1i64..800_000,
        hash in prop::option::of(prop::array::uniform32(0u8..)),
    ) {
        let wallet = wallet_with_history(&heights, last_seen, hash);

        reset_wallet(&wallet);
        let once = wallet.snapshot();
        reset_wallet(&wallet);
        let twice = wallet.snapshot();

        prop_assert_eq!(once, twice);
        prop_assert_eq!(wallet.transaction_count(), 0);
        prop_assert_eq!(wallet.last_seen_block_height(), UNKNOWN_BLOCK_HEIGHT);
        prop_assert!(wallet.last_seen_block_hash().is_none());
    }

    /// A present header store never mutates the wallet.
    #[test]
    fn keep_preserves_wallet(
        heights in prop::collection::vec(0u32..800_000, 0..50),
        last_seen in 0i64..800_000,
    ) {
        let wallet = wallet_with_history(&heights, last_seen, Some([7; 32]));
        let before = wallet.snapshot();

        WalletResetPolicy::decide(true).apply(&wallet);

        prop_assert_eq!(wallet.snapshot(), before);
        prop_assert_eq!(wallet.clear_calls(), 0);
    }
}
