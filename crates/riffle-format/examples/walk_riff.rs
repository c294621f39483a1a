//! Example: Walk a RIFF file with a declared schema.
//!
//! Writes a small SoundFont-shaped file to a temp directory, then parses it
//! with a registry that turns the `INFO` entries into properties and prints
//! every visitor callback as an indented outline.

use std::fs::File;
use std::io::BufReader;

use riffle_format::{Chunk, FourCC, Registry, RiffParser, Visitor};

/// Prints the outline of the tree as callbacks arrive.
#[derive(Default)]
struct Outline {
    depth: usize,
}

impl Visitor for Outline {
    fn enter_group(&mut self, group: &Chunk) -> riffle_format::Result<()> {
        let sub = group.sub_type().unwrap_or(group.id());
        println!(
            "{:indent$}{} '{}' ({} bytes @ {})",
            "",
            group.id(),
            sub,
            group.declared_size(),
            group.offset(),
            indent = self.depth * 2
        );
        self.depth += 1;
        Ok(())
    }

    fn leave_group(&mut self, group: &Chunk) -> riffle_format::Result<()> {
        for prop in group.properties() {
            let text = prop
                .payload()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
                .unwrap_or_default();
            println!("{:indent$}. {} = {:?}", "", prop.id(), text, indent = self.depth * 2);
        }
        if let Some(note) = group.note() {
            println!("{:indent$}! {}", "", note, indent = self.depth * 2);
        }
        self.depth -= 1;
        Ok(())
    }

    fn visit_chunk(&mut self, _parent: &Chunk, chunk: &Chunk) -> riffle_format::Result<()> {
        println!(
            "{:indent$}{} ({} bytes) {}",
            "",
            chunk.id(),
            chunk.declared_size(),
            chunk.id().name(),
            indent = self.depth * 2
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.sf2");

    let id = |s: &[u8; 4]| FourCC::from_bytes(*s);

    let mut info = Chunk::list(id(b"INFO"));
    info.push(Chunk::local(id(b"ifil"), vec![2, 0, 1, 0]));
    info.push(Chunk::local(id(b"INAM"), b"Demo Bank\0".to_vec()));
    let mut sdta = Chunk::list(id(b"sdta"));
    sdta.push(Chunk::local(id(b"smpl"), vec![0u8; 4096]));
    let mut pdta = Chunk::list(id(b"pdta"));
    pdta.push(Chunk::local(id(b"phdr"), vec![0u8; 38 * 2]));
    pdta.push(Chunk::local(id(b"pbag"), vec![0u8; 4 * 2]));

    let bank = Chunk::riff(id(b"sfbk"))
        .with_child(info)
        .with_child(sdta)
        .with_child(pdta);
    bank.write(File::create(&path)?)?;

    println!("=== RIFF Outline ===\n");

    let mut registry = Registry::new();
    registry
        .declare_property(id(b"INFO"), id(b"ifil"))
        .declare_property(id(b"INFO"), id(b"INAM"))
        .declare_data(id(b"sdta"), id(b"smpl"))
        .declare_data(id(b"pdta"), id(b"phdr"))
        .declare_data(id(b"pdta"), id(b"pbag"));

    let mut outline = Outline::default();
    let consumed = RiffParser::new(&registry).parse(
        BufReader::new(File::open(&path)?),
        &mut outline,
        false,
    )?;

    println!("\n{} bytes consumed", consumed);
    Ok(())
}
