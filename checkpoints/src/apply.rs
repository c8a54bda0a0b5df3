//! Applying a checkpoint to a header store.

use chainload_store::HeaderStore;
use chainload_types::{StoredHeader, Timestamp};

use crate::{CheckpointError, CheckpointSet};

/// Advance `store` to the checkpoint nearest to, but not after,
/// `earliest_key_time`.
///
/// The chain head never moves backwards: when the selected checkpoint is not
/// above the current head nothing is written and `None` is returned.
pub fn apply(
    set: &CheckpointSet,
    store: &dyn HeaderStore,
    earliest_key_time: Timestamp,
) -> Result<Option<StoredHeader>, CheckpointError> {
    let checkpoint = *set.checkpoint_before(earliest_key_time);
    let head = store.chain_head();

    if checkpoint.height <= head.height {
        tracing::debug!(
            checkpoint_height = checkpoint.height,
            head_height = head.height,
            "store already past checkpoint"
        );
        return Ok(None);
    }

    store.put(&checkpoint)?;
    store.set_chain_head(&checkpoint)?;

    tracing::info!(
        height = checkpoint.height,
        hash = %checkpoint.hash(),
        time = checkpoint.header.time,
        "checkpoint applied"
    );
    Ok(Some(checkpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainload_nullables::NullHeaderStore;
    use chainload_types::{BlockHash, BlockHeader, NetworkId, NetworkParams};

    fn checkpoint(height: u32, time: u32) -> StoredHeader {
        let header = BlockHeader {
            version: 2,
            prev_block: BlockHash::new([0x10; 32]),
            merkle_root: [0x20; 32],
            time,
            bits: 0x1d00ffff,
            nonce: height,
        };
        StoredHeader::new(header, height, u128::from(height) << 32)
    }

    fn sample_set() -> CheckpointSet {
        CheckpointSet::from_headers(vec![
            checkpoint(20_160, 1_300_000_000),
            checkpoint(40_320, 1_310_000_000),
        ])
        .unwrap()
    }

    fn genesis_store() -> NullHeaderStore {
        NullHeaderStore::for_network(&NetworkParams::for_network(NetworkId::Test))
    }

    #[test]
    fn advances_fresh_store() {
        let store = genesis_store();
        let applied = apply(&sample_set(), &store, Timestamp::new(1_305_000_000))
            .unwrap()
            .expect("checkpoint applied");

        assert_eq!(applied.height, 20_160);
        assert_eq!(store.chain_head(), applied);
        assert_eq!(store.get(&applied.hash()).unwrap(), Some(applied));
    }

    #[test]
    fn never_rewinds() {
        let store = genesis_store();
        let ahead = checkpoint(45_000, 1_320_000_000);
        store.put(&ahead).unwrap();
        store.set_chain_head(&ahead).unwrap();
        let writes = store.write_count();

        let applied = apply(&sample_set(), &store, Timestamp::new(1_400_000_000)).unwrap();
        assert!(applied.is_none());
        assert_eq!(store.chain_head(), ahead);
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn store_failure_is_reported() {
        let store = genesis_store();
        store.fail_writes(true);
        let err = apply(&sample_set(), &store, Timestamp::new(1_305_000_000)).unwrap_err();
        assert!(matches!(err, CheckpointError::Store(_)));
        assert_eq!(store.chain_head().height, 0);
    }
}
