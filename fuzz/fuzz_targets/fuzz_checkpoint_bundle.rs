#![no_main]

use libfuzzer_sys::fuzz_target;

use chainload_checkpoints::CheckpointSet;
use chainload_types::Timestamp;

fuzz_target!(|data: &[u8]| {
    // Parsing must reject malformed bundles with an error, never a panic.
    let Ok(set) = CheckpointSet::load(data) else {
        return;
    };

    // Anything that parses is non-empty and strictly increasing.
    assert!(!set.is_empty());
    let headers: Vec<_> = set.iter().collect();
    for pair in headers.windows(2) {
        assert!(pair[0].height < pair[1].height);
        assert!(pair[0].timestamp() < pair[1].timestamp());
    }

    let chosen = set.checkpoint_before(Timestamp::new(u64::from(set.latest().header.time)));
    assert_eq!(chosen, set.latest());

    let mut text = Vec::new();
    set.write_text(&mut text).expect("parsed sets are writable");
    let reparsed = CheckpointSet::load(text.as_slice()).expect("written bundle parses");
    assert_eq!(reparsed.data_hash(), set.data_hash());
});
