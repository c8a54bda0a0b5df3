#![no_main]

use libfuzzer_sys::fuzz_target;

use chainload_types::{BlockHeader, StoredHeader};

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = BlockHeader::from_bytes(data) {
        assert_eq!(&header.to_bytes()[..], data);
    }

    if let Ok(stored) = StoredHeader::from_compact_bytes(data) {
        let encoded = stored.to_compact_bytes().expect("decoded work fits the compact field");
        assert_eq!(&encoded[..], data);
    }

    // The LMDB backend stores headers with bincode.
    let _ = bincode::deserialize::<StoredHeader>(data);
});
