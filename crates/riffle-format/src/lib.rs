//! # riffle-format
//!
//! A declarative engine for RIFF-style chunk containers, the layer that WAV,
//! SoundFont 2, DLS and similar sample-library formats are built on. Format
//! readers declare how each chunk should be treated and receive the results
//! through a visitor; format writers assemble a [`Chunk`] tree and let it
//! compute its own sizes.
//!
//! ## Format Overview
//!
//! - **Group**: `RIFF`/`LIST` id, 32-bit length, 4-byte sub-type, children
//! - **Local chunk**: id, 32-bit length, payload, one pad byte if the length is odd
//!
//! ## Example
//! ```rust
//! use riffle_format::{Chunk, ChunkTree, FourCC, Registry, RiffParser};
//!
//! let wave = FourCC::from_bytes(*b"WAVE");
//! let riff = Chunk::riff(wave)
//!     .with_child(Chunk::local(FourCC::from_bytes(*b"fmt "), vec![0u8; 16]))
//!     .with_child(Chunk::local(FourCC::from_bytes(*b"data"), vec![1, 2, 3]));
//!
//! let mut bytes = Vec::new();
//! riff.write(&mut bytes).unwrap();
//! assert_eq!(bytes.len() as u64, riff.encoded_size());
//!
//! let registry = Registry::new();
//! let mut tree = ChunkTree::new();
//! RiffParser::new(&registry).parse(&bytes[..], &mut tree, false).unwrap();
//! assert_eq!(tree.into_root().unwrap(), riff);
//! ```

pub mod chunk;
pub mod error;
pub mod fourcc;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod visitor;
pub mod writer;

pub use chunk::{Chunk, CHUNK_HEADER_SIZE};
pub use error::{Result, RiffError};
pub use fourcc::{FourCC, KnownId, ParseFourCCError};
pub use parser::{ParseOptions, RiffParser, DEFAULT_MAX_PAYLOAD_LEN};
pub use reader::{ByteReader, Endian};
pub use registry::{Registry, Role};
pub use visitor::{ChunkTree, Visitor};
pub use writer::ByteWriter;
