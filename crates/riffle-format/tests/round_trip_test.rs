//! Integration tests: build chunk trees, write them, parse them back.
//!
//! Covers the end-to-end guarantees of the engine: byte-exact round trips,
//! size consistency, alignment, default classification, stop scans and
//! recovery from truncated input.

use std::fs::File;
use std::io::{BufReader, Read, Write};

use riffle_format::{
    Chunk, ChunkTree, FourCC, ParseOptions, Registry, Result, RiffParser, Visitor,
};

fn id(s: &str) -> FourCC {
    s.parse().unwrap()
}

fn to_bytes(chunk: &Chunk) -> Vec<u8> {
    let mut buf = Vec::new();
    chunk.write(&mut buf).unwrap();
    buf
}

fn parse_tree(registry: &Registry, bytes: &[u8]) -> (u64, Chunk) {
    let mut tree = ChunkTree::new();
    let consumed = RiffParser::new(registry)
        .parse(bytes, &mut tree, false)
        .unwrap();
    (consumed, tree.into_root().unwrap())
}

/// A small SoundFont-shaped tree.
fn sample_bank() -> Chunk {
    let mut info = Chunk::list(id("INFO"));
    info.push(Chunk::local(id("ifil"), vec![2, 0, 1, 0]));
    info.push(Chunk::local(id("INAM"), b"Grand Piano\0".to_vec()));
    info.push(Chunk::local(id("ICMT"), b"odd".to_vec()));

    let mut sdta = Chunk::list(id("sdta"));
    sdta.push(Chunk::local(id("smpl"), (0..=200u8).collect::<Vec<_>>()));

    let mut pdta = Chunk::list(id("pdta"));
    pdta.push(Chunk::local(id("phdr"), vec![0x11; 38]));
    pdta.push(Chunk::local(id("pbag"), vec![0x22; 4]));
    pdta.push(Chunk::local(id("shdr"), vec![0x33; 46]));

    Chunk::riff(id("sfbk"))
        .with_child(info)
        .with_child(sdta)
        .with_child(pdta)
}

/// Collects the ids and payloads of visited chunks in order.
#[derive(Default)]
struct Flat(Vec<(FourCC, u64, Option<Vec<u8>>)>);

impl Visitor for Flat {
    fn visit_chunk(&mut self, _parent: &Chunk, chunk: &Chunk) -> Result<()> {
        self.0
            .push((chunk.id(), chunk.declared_size(), chunk.payload().map(<[u8]>::to_vec)));
        Ok(())
    }
}

#[test]
fn test_example_container() {
    let bytes = b"RIFF\x10\x00\x00\x00TESTDATA\x03\x00\x00\x00\x01\x02\x03\x00";

    let mut flat = Flat::default();
    let consumed = RiffParser::new(&Registry::new())
        .parse(&bytes[..], &mut flat, false)
        .unwrap();

    // Group header (12) + DATA header (8) + payload (3) + pad (1).
    assert_eq!(consumed, 24);
    assert_eq!(flat.0, vec![(id("DATA"), 3, Some(vec![1, 2, 3]))]);

    let tree = Chunk::riff(id("TEST")).with_child(Chunk::local(id("DATA"), vec![1, 2, 3]));
    assert_eq!(to_bytes(&tree), bytes.to_vec());
}

#[test]
fn test_round_trip_is_byte_exact() {
    let bank = sample_bank();
    let bytes = to_bytes(&bank);
    let (consumed, parsed) = parse_tree(&Registry::new(), &bytes);

    assert_eq!(consumed, bytes.len() as u64);
    assert_eq!(parsed, bank);
    assert_eq!(to_bytes(&parsed), bytes);
}

#[test]
fn test_round_trip_with_attachments() {
    let mut info = Chunk::list(id("INFO"));
    info.set_property(Chunk::local(id("INAM"), b"Pad\0".to_vec()));
    info.set_property(Chunk::local(id("ifil"), vec![2, 0, 4, 0]));
    let mut pdta = Chunk::list(id("pdta"));
    pdta.add_collection(Chunk::local(id("pgen"), vec![1, 2, 3, 4]));
    pdta.add_collection(Chunk::local(id("pgen"), vec![5, 6, 7, 8]));
    pdta.push(Chunk::local(id("phdr"), vec![9; 38]));
    let bank = Chunk::riff(id("sfbk")).with_child(info).with_child(pdta);

    let mut registry = Registry::new();
    registry
        .declare_property(id("INFO"), id("INAM"))
        .declare_property(id("INFO"), id("ifil"))
        .declare_collection(id("pdta"), id("pgen"))
        .declare_data(id("pdta"), id("phdr"));

    let bytes = to_bytes(&bank);
    let (_, parsed) = parse_tree(&registry, &bytes);
    assert_eq!(parsed, bank);

    let pgen: Vec<_> = parsed.children()[1]
        .collection(id("pgen"))
        .map(|c| c.payload().unwrap().to_vec())
        .collect();
    assert_eq!(pgen, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
}

#[test]
fn test_encoded_size_matches_written_bytes() {
    let bank = sample_bank();
    assert_eq!(bank.encoded_size(), to_bytes(&bank).len() as u64);
    for list in bank.children() {
        assert_eq!(list.encoded_size(), to_bytes(list).len() as u64);
        for chunk in list.children() {
            assert_eq!(chunk.encoded_size(), to_bytes(chunk).len() as u64);
        }
    }
}

#[test]
fn test_final_position_is_even() {
    for payload_len in 0..6usize {
        let tree = Chunk::riff(id("WAVE"))
            .with_child(Chunk::local(id("data"), vec![0xEE; payload_len]))
            .with_child(Chunk::local(id("note"), vec![0xDD; payload_len + 1]));
        let bytes = to_bytes(&tree);
        let (consumed, _) = parse_tree(&Registry::new(), &bytes);
        assert_eq!(consumed % 2, 0, "payload_len {payload_len}");
        assert_eq!(consumed, bytes.len() as u64);
    }
}

#[test]
fn test_default_registry_visits_two_data_chunks_in_order() {
    let tree = Chunk::riff(id("WAVE"))
        .with_child(Chunk::local(id("fmt "), vec![1, 0, 2, 0]))
        .with_child(Chunk::local(id("data"), vec![7, 7, 7]));
    let bytes = to_bytes(&tree);

    let mut flat = Flat::default();
    RiffParser::new(&Registry::new())
        .parse(&bytes[..], &mut flat, false)
        .unwrap();
    assert_eq!(
        flat.0,
        vec![
            (id("fmt "), 4, Some(vec![1, 0, 2, 0])),
            (id("data"), 3, Some(vec![7, 7, 7])),
        ]
    );
}

/// Byte source that records the largest single read request it served.
struct CountingSource<'a> {
    data: &'a [u8],
    largest_read: usize,
}

impl Read for CountingSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.read(buf)?;
        self.largest_read = self.largest_read.max(n);
        Ok(n)
    }
}

#[test]
fn test_stop_all_scan_never_materializes_payload() {
    const MIB: usize = 1024 * 1024;
    let tree = Chunk::riff(id("WAVE"))
        .with_child(Chunk::local(id("fmt "), vec![0; 16]))
        .with_child(Chunk::local(id("data"), vec![0x5A; MIB]));
    let bytes = to_bytes(&tree);

    let mut registry = Registry::new();
    registry.declare_stop_all();
    let options = ParseOptions {
        visit_stop_chunks: true,
        ..ParseOptions::default()
    };

    let mut source = CountingSource {
        data: &bytes,
        largest_read: 0,
    };
    let mut flat = Flat::default();
    let consumed = RiffParser::with_options(&registry, options)
        .parse(&mut source, &mut flat, false)
        .unwrap();

    assert_eq!(consumed, bytes.len() as u64);
    assert_eq!(
        flat.0,
        vec![(id("fmt "), 16, None), (id("data"), MIB as u64, None)]
    );
    // Skipping streams through a small scratch buffer.
    assert!(source.largest_read < MIB);
}

#[test]
fn test_truncated_container_leaves_group_with_note() {
    let bytes = to_bytes(&sample_bank());
    let available = &bytes[..bytes.len() - 20];

    #[derive(Default)]
    struct Notes(Vec<(FourCC, Option<String>)>);

    impl Visitor for Notes {
        fn leave_group(&mut self, group: &Chunk) -> Result<()> {
            self.0
                .push((group.sub_type().unwrap(), group.note().map(str::to_string)));
            Ok(())
        }

        fn visit_chunk(&mut self, _parent: &Chunk, _chunk: &Chunk) -> Result<()> {
            Ok(())
        }
    }

    let mut notes = Notes::default();
    let consumed = RiffParser::new(&Registry::new())
        .parse(available, &mut notes, false)
        .unwrap();

    assert_eq!(consumed, available.len() as u64);
    let (last_type, last_note) = notes.0.last().unwrap();
    assert_eq!(*last_type, id("sfbk"));
    assert!(last_note.as_deref().unwrap().starts_with("unexpected end after"));
    // The list being read when the bytes ran out is noted as well.
    assert!(notes
        .0
        .iter()
        .any(|(t, n)| *t == id("pdta") && n.is_some()));
    assert!(notes
        .0
        .iter()
        .any(|(t, n)| *t == id("INFO") && n.is_none()));
}

#[test]
fn test_odd_payload_is_padded_and_restored() {
    let tree = Chunk::riff(id("WAVE")).with_child(Chunk::local(id("data"), vec![1, 2, 3, 4, 5]));
    let bytes = to_bytes(&tree);
    assert_eq!(bytes.len() % 2, 0);
    assert_eq!(*bytes.last().unwrap(), 0);

    let (_, parsed) = parse_tree(&Registry::new(), &bytes);
    let data = &parsed.children()[0];
    assert_eq!(data.declared_size(), 5);
    assert_eq!(data.payload(), Some(&[1, 2, 3, 4, 5][..]));
}

#[test]
fn test_recovered_garbage_is_written_back() {
    let mut bytes = to_bytes(&sample_bank());
    // Corrupt the id of `ICMT`, the last chunk of the INFO list.
    let pos = bytes.windows(4).position(|w| w == b"ICMT").unwrap();
    bytes[pos] = 0x00;

    let (consumed, parsed) = parse_tree(&Registry::new(), &bytes);
    assert_eq!(consumed, bytes.len() as u64);

    let info = &parsed.children()[0];
    assert!(info.had_recovery());
    assert_eq!(info.children().len(), 2);
    assert_eq!(info.trailing().unwrap().len(), 12);
    assert_eq!(to_bytes(&parsed), bytes);
}

#[test]
fn test_parse_from_file() {
    let bank = sample_bank();
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    bank.write(tmp.as_file_mut()).unwrap();
    tmp.flush().unwrap();

    let reader = BufReader::new(File::open(tmp.path()).unwrap());
    let mut tree = ChunkTree::new();
    let consumed = RiffParser::new(&Registry::new())
        .parse(reader, &mut tree, false)
        .unwrap();

    assert_eq!(consumed, bank.encoded_size());
    assert_eq!(tree.into_root().unwrap(), bank);
}
