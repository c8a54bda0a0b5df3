use proptest::prelude::*;

use chainload_types::{BlockHash, BlockHeader, StoredHeader, Timestamp};

fn arb_header() -> impl Strategy<Value = BlockHeader> {
    (
        any::<u32>(),
        prop::array::uniform32(0u8..),
        prop::array::uniform32(0u8..),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
    )
        .prop_map(|(version, prev, merkle_root, time, bits, nonce)| BlockHeader {
            version,
            prev_block: BlockHash::new(prev),
            merkle_root,
            time,
            bits,
            nonce,
        })
}

proptest! {
    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Display order is the reverse of internal order.
    #[test]
    fn block_hash_display_is_reversed(bytes in prop::array::uniform32(0u8..)) {
        let shown = BlockHash::new(bytes).to_string();
        let mut reversed = bytes;
        reversed.reverse();
        prop_assert_eq!(shown, hex::encode(reversed));
    }

    /// Decoding the wire form and hashing again yields the same block hash.
    #[test]
    fn header_hash_stable_across_wire_encoding(header in arb_header()) {
        let decoded = BlockHeader::from_bytes(&header.to_bytes()).unwrap();
        prop_assert_eq!(decoded.hash(), header.hash());
    }

    /// Stored headers survive bincode, as the LMDB backend persists them that way.
    #[test]
    fn stored_header_bincode(header in arb_header(), height in any::<u32>(), work in any::<u128>()) {
        let stored = StoredHeader::new(header, height, work);
        let encoded = bincode::serialize(&stored).unwrap();
        let decoded: StoredHeader = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, stored);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// saturating_sub_secs never goes below the epoch.
    #[test]
    fn timestamp_saturating_sub(base in 0u64..1_000_000, secs in 0u64..2_000_000) {
        let t = Timestamp::new(base).saturating_sub_secs(secs);
        prop_assert_eq!(t.as_secs(), base.saturating_sub(secs));
    }
}
