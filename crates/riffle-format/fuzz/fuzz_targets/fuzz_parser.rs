//! Fuzz target for the chunk parser.
//!
//! Feeds arbitrary bytes to `RiffParser::parse` under several registries to
//! find crashes, panics, and hangs in the recursive descent.

#![no_main]

use libfuzzer_sys::fuzz_target;
use riffle_format::{ChunkTree, FourCC, ParseOptions, Registry, RiffParser};

fuzz_target!(|data: &[u8]| {
    let empty = Registry::new();

    let mut schema = Registry::new();
    schema
        .declare_property(FourCC::from_bytes(*b"WAVE"), FourCC::from_bytes(*b"fmt "))
        .declare_collection(FourCC::from_bytes(*b"INFO"), FourCC::from_bytes(*b"INAM"));

    let mut stop = Registry::new();
    stop.declare_stop_all();

    // Keep allocations bounded: lengths come straight from the input.
    let options = ParseOptions {
        max_payload_len: 1 << 20,
        visit_stop_chunks: true,
        ..ParseOptions::default()
    };

    for registry in [&empty, &schema, &stop] {
        let mut tree = ChunkTree::new();
        let parser = RiffParser::with_options(registry, options.clone());
        if let Ok(consumed) = parser.parse(data, &mut tree, true) {
            assert!(consumed <= data.len() as u64);
        }
    }
});
