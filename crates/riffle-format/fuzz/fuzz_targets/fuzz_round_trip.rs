//! Fuzz target for write → parse round-trip.
//!
//! Uses the fuzzer input to shape a chunk tree, writes it, parses it back,
//! and verifies sizes and structure survive.

#![no_main]

use libfuzzer_sys::fuzz_target;
use riffle_format::{Chunk, ChunkTree, FourCC, Registry, RiffParser};

/// Map an input byte onto a printable, non-group id.
fn id_from(seed: u8) -> FourCC {
    let c = b'a' + seed % 26;
    FourCC::from_bytes([c, b'z', b'z', b'0' + seed % 10])
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut riff = Chunk::riff(FourCC::from_bytes(*b"FUZZ"));
    let mut list = Chunk::list(FourCC::from_bytes(*b"INFO"));

    // Each (seed, len) pair becomes one chunk; even seeds go into the list.
    let mut rest = data;
    while rest.len() >= 2 {
        let seed = rest[0];
        let len = (rest[1] as usize).min(rest.len() - 2);
        let chunk = Chunk::local(id_from(seed), rest[2..2 + len].to_vec());
        if seed % 2 == 0 {
            list.push(chunk);
        } else {
            riff.push(chunk);
        }
        rest = &rest[2 + len..];
    }
    riff.push(list);

    let mut bytes = Vec::new();
    if riff.write(&mut bytes).is_err() {
        return;
    }
    assert_eq!(bytes.len() as u64, riff.encoded_size());

    let mut tree = ChunkTree::new();
    let consumed = RiffParser::new(&Registry::new())
        .parse(&bytes[..], &mut tree, false)
        .expect("written tree must parse");
    assert_eq!(consumed, bytes.len() as u64);
    assert_eq!(tree.into_root().as_ref(), Some(&riff));
});
