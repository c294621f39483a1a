//! riffle CLI: inspect the chunk structure of RIFF-style files.
//!
//! Works on any container built from `RIFF`/`LIST` groups: WAV, SoundFont 2,
//! DLS and their relatives. Nothing is decoded; the tool only reports how the
//! file is laid out.
//!
//! # Usage
//!
//! ```bash
//! riffle tree bank.sf2
//! riffle tree bank.sf2 --json --property INFO:INAM
//! riffle scan huge.wav
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use riffle_format::{
    ByteReader, Chunk, ChunkTree, Endian, FourCC, ParseOptions, Registry, RiffParser, Visitor,
};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `riffle` binary.
#[derive(Parser)]
#[command(
    name = "riffle",
    about = "Inspect the chunk structure of RIFF-style files",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the full chunk tree of a file.
    Tree {
        /// Input file path.
        input: PathBuf,

        /// Output the tree as JSON.
        #[arg(long)]
        json: bool,

        /// Treat every local chunk as a stop chunk (no payloads are read).
        #[arg(long)]
        stop_all: bool,

        /// Attach CONTAINER:ID chunks to their group as properties.
        #[arg(long, value_name = "CONTAINER:ID", value_parser = parse_rule)]
        property: Vec<(FourCC, FourCC)>,

        /// Attach CONTAINER:ID chunks to their group as a collection.
        #[arg(long, value_name = "CONTAINER:ID", value_parser = parse_rule)]
        collection: Vec<(FourCC, FourCC)>,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Walk the structure of a file without reading any payload.
    Scan {
        /// Input file path.
        input: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },
}

/// Options shared by every command that parses a file.
#[derive(Args)]
struct ParseArgs {
    /// Read length fields as big-endian (RIFX-style files).
    #[arg(long)]
    big_endian: bool,

    /// Stop quietly at data that is not a RIFF container instead of failing.
    #[arg(long)]
    ignore_unknown: bool,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            byte_order: if self.big_endian {
                Endian::Big
            } else {
                Endian::Little
            },
            ..ParseOptions::default()
        }
    }
}

/// Parse a `CONTAINER:ID` pair such as `INFO:INAM`.
fn parse_rule(s: &str) -> Result<(FourCC, FourCC)> {
    let Some((container, id)) = s.split_once(':') else {
        bail!("expected CONTAINER:ID, got '{}'", s);
    };
    let container: FourCC = container
        .parse()
        .with_context(|| format!("invalid container type '{}'", container))?;
    let id: FourCC = id
        .parse()
        .with_context(|| format!("invalid chunk id '{}'", id))?;
    Ok((container, id))
}

// ──────────────────────────────── main ────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tree {
            input,
            json,
            stop_all,
            property,
            collection,
            parse,
        } => {
            let mut registry = Registry::new();
            for (container, id) in property {
                registry.declare_property(container, id);
            }
            for (container, id) in collection {
                registry.declare_collection(container, id);
            }
            if stop_all {
                registry.declare_stop_all();
            }
            // Undeclared chunks still show up, without their payloads.
            let mut options = parse.options();
            options.visit_stop_chunks = true;
            cmd_tree(&input, &registry, options, parse.ignore_unknown, json)
        }

        Commands::Scan { input, parse } => {
            let mut registry = Registry::new();
            registry.declare_stop_all();
            let mut options = parse.options();
            options.visit_stop_chunks = true;
            cmd_scan(&input, &registry, options, parse.ignore_unknown)
        }
    }
}

/// Parse every top-level item of the file until it is exhausted.
///
/// Returns `(consumed, file_size)`; `consumed` falls short only when
/// `ignore_unknown` stopped the parse at unrecognized data.
fn parse_file<V: Visitor>(
    path: &Path,
    registry: &Registry,
    options: ParseOptions,
    ignore_unknown: bool,
    visitor: &mut V,
) -> Result<(u64, u64)> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let file_size = file
        .metadata()
        .with_context(|| format!("Failed to stat file: {}", path.display()))?
        .len();

    let parser = RiffParser::with_options(registry, options);
    let mut reader = ByteReader::new(BufReader::new(file));
    while reader.position() < file_size {
        let before = reader.position();
        let consumed = parser
            .parse_reader(&mut reader, &mut *visitor, ignore_unknown)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if consumed == before {
            break;
        }
    }
    Ok((reader.position(), file_size))
}

// ──────────────────────────────── tree ────────────────────────────────────

fn cmd_tree(
    input: &Path,
    registry: &Registry,
    options: ParseOptions,
    ignore_unknown: bool,
    json: bool,
) -> Result<()> {
    let mut tree = ChunkTree::new();
    let (consumed, file_size) = parse_file(input, registry, options, ignore_unknown, &mut tree)?;

    if json {
        let roots: Vec<serde_json::Value> = tree.roots().iter().map(node_json).collect();
        let out = serde_json::json!({
            "file": input.display().to_string(),
            "file_size": file_size,
            "consumed": consumed,
            "roots": roots,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} ({} bytes)", input.display(), file_size);
    for root in tree.roots() {
        print_node(root, 1);
    }
    if consumed < file_size {
        println!("  {} unparsed bytes at offset {}", file_size - consumed, consumed);
    }
    Ok(())
}

/// JSON description of a node and everything attached to it.
fn node_json(chunk: &Chunk) -> serde_json::Value {
    let mut node = serde_json::json!({
        "id": chunk.id().to_string(),
        "name": label(chunk).name(),
        "offset": chunk.offset(),
        "size": chunk.declared_size(),
        "encoded_size": chunk.encoded_size(),
    });

    if let Some(sub) = chunk.sub_type() {
        node["sub_type"] = serde_json::Value::String(sub.to_string());
        node["children"] = chunk.children().iter().map(node_json).collect();
        let properties: Vec<_> = chunk.properties().map(node_json).collect();
        if !properties.is_empty() {
            node["properties"] = properties.into();
        }
        if !chunk.collections().is_empty() {
            node["collections"] = chunk.collections().iter().map(node_json).collect();
        }
    }
    if let Some(trailing) = chunk.trailing() {
        node["trailing_bytes"] = trailing.len().into();
    }
    if chunk.oversized() {
        node["oversized"] = true.into();
    }
    if let Some(note) = chunk.note() {
        node["note"] = note.into();
    }
    node
}

fn print_node(chunk: &Chunk, depth: usize) {
    let indent = depth * 2;
    match chunk.sub_type() {
        Some(sub) => println!(
            "{:indent$}{} '{}' {} ({} bytes @ {})",
            "",
            chunk.id(),
            sub,
            sub.name(),
            chunk.declared_size(),
            chunk.offset()
        ),
        None => println!(
            "{:indent$}{} {} ({} bytes @ {})",
            "",
            chunk.id(),
            chunk.id().name(),
            chunk.declared_size(),
            chunk.offset()
        ),
    }

    for prop in chunk.properties() {
        println!("{:indent$}  = {}", "", describe_local(prop));
    }
    for item in chunk.collections() {
        println!("{:indent$}  + {}", "", describe_local(item));
    }
    for child in chunk.children() {
        print_node(child, depth + 1);
    }
    if let Some(trailing) = chunk.trailing() {
        println!("{:indent$}  ? {} trailing bytes", "", trailing.len());
    }
    if let Some(note) = chunk.note() {
        println!("{:indent$}  ! {}", "", note);
    }
}

fn describe_local(chunk: &Chunk) -> String {
    match chunk.payload().and_then(printable) {
        Some(text) => format!("{} {:?}", chunk.id(), text),
        None => format!("{} ({} bytes)", chunk.id(), chunk.declared_size()),
    }
}

/// Text payloads such as `INFO` strings, without their NUL terminators.
fn printable(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?.trim_end_matches('\0');
    if text.is_empty() || text.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(text.to_string())
}

fn label(chunk: &Chunk) -> FourCC {
    chunk.sub_type().unwrap_or(chunk.id())
}

// ──────────────────────────────── scan ────────────────────────────────────

/// Prints one line per header as the parser reaches it.
#[derive(Default)]
struct ScanPrinter {
    depth: usize,
    groups: u64,
    chunks: u64,
    payload_bytes: u64,
}

impl Visitor for ScanPrinter {
    fn enter_group(&mut self, group: &Chunk) -> riffle_format::Result<()> {
        println!(
            "{:>10}  {:indent$}{} '{}' {}",
            group.offset(),
            "",
            group.id(),
            label(group),
            human_size(group.declared_size()),
            indent = self.depth * 2
        );
        self.depth += 1;
        self.groups += 1;
        Ok(())
    }

    fn leave_group(&mut self, group: &Chunk) -> riffle_format::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        if let Some(note) = group.note() {
            println!("{:>10}  {:indent$}! {}", "", "", note, indent = self.depth * 2 + 2);
        }
        Ok(())
    }

    fn visit_chunk(&mut self, _parent: &Chunk, chunk: &Chunk) -> riffle_format::Result<()> {
        println!(
            "{:>10}  {:indent$}{} {}",
            chunk.offset(),
            "",
            chunk.id(),
            human_size(chunk.declared_size()),
            indent = self.depth * 2
        );
        self.chunks += 1;
        self.payload_bytes += chunk.declared_size();
        Ok(())
    }
}

fn cmd_scan(
    input: &Path,
    registry: &Registry,
    options: ParseOptions,
    ignore_unknown: bool,
) -> Result<()> {
    let mut printer = ScanPrinter::default();
    println!("{:>10}  structure", "offset");
    let (consumed, file_size) =
        parse_file(input, registry, options, ignore_unknown, &mut printer)?;

    println!();
    println!(
        "{} groups, {} chunks, {} of payload skipped",
        printer.groups,
        printer.chunks,
        human_size(printer.payload_bytes)
    );
    if consumed < file_size {
        println!("{} unparsed bytes at offset {}", file_size - consumed, consumed);
    }
    tracing::debug!(consumed, file_size, "Scan finished");
    Ok(())
}

/// Format a byte count as a human-readable size string.
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

