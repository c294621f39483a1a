//! Recursive-descent parser over nested, length-prefixed chunks.
//!
//! The parser reads the outermost `RIFF` group, classifies each chunk with a
//! [`Registry`] and streams the results to a [`Visitor`]. It never seeks:
//! group ends are computed from the running position of a [`ByteReader`].
//!
//! # Failure containment
//!
//! - Running out of bytes while reading a group's children records an
//!   `unexpected end` note on that group and ends it normally.
//! - A malformed child id, or a child group declaring fewer than 4 bytes,
//!   inside a nested `LIST` captures the rest of that list as a trailing blob
//!   on the list, records a note and ends the list.
//! - The same defects directly inside the outermost `RIFF` group are fatal,
//!   as are an unknown top-level id and an invalid sub-type.
//! - Errors returned by the visitor are never contained.
//!
//! # Example
//!
//! ```rust
//! use riffle_format::{Chunk, FourCC, Registry, RiffParser, Visitor};
//!
//! struct Names(Vec<String>);
//!
//! impl Visitor for Names {
//!     fn visit_chunk(&mut self, _parent: &Chunk, chunk: &Chunk) -> riffle_format::Result<()> {
//!         self.0.push(chunk.id().to_string());
//!         Ok(())
//!     }
//! }
//!
//! let bytes = b"RIFF\x10\x00\x00\x00TESTDATA\x03\x00\x00\x00\x01\x02\x03\x00";
//! let registry = Registry::new();
//! let mut names = Names(Vec::new());
//! let consumed = RiffParser::new(&registry)
//!     .parse(&bytes[..], &mut names, false)
//!     .unwrap();
//! assert_eq!(consumed, 24);
//! assert_eq!(names.0, vec!["DATA"]);
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::error::{Result, RiffError};
use crate::fourcc::FourCC;
use crate::reader::{ByteReader, Endian};
use crate::registry::{Registry, Role};
use crate::visitor::Visitor;
use crate::writer::ByteWriter;

/// Default payload limit: the largest length a signed 32-bit field can hold.
pub const DEFAULT_MAX_PAYLOAD_LEN: u64 = i32::MAX as u64;

/// Per-parse settings that are not classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Byte order of every length field.
    pub byte_order: Endian,
    /// Call `visit_chunk` for stop chunks (without payload).
    pub visit_stop_chunks: bool,
    /// Local chunks declaring more bytes than this are marked oversized and
    /// skipped without allocating.
    pub max_payload_len: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            byte_order: Endian::Little,
            visit_stop_chunks: false,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

/// Outcome of one child inside a group body.
enum Step {
    Continue,
    /// The rest of the group was captured as garbage.
    Finished,
}

/// Parser bound to a frozen [`Registry`].
#[derive(Debug, Clone)]
pub struct RiffParser<'r> {
    registry: &'r Registry,
    options: ParseOptions,
}

impl<'r> RiffParser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, ParseOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse one container from `source`, returning the number of bytes
    /// consumed.
    ///
    /// With `ignore_unknown_top_level`, a source that does not start with
    /// `RIFF` or a filler chunk ends the parse cleanly with zero bytes
    /// consumed instead of failing.
    pub fn parse<R: Read, V: Visitor + ?Sized>(
        &self,
        source: R,
        visitor: &mut V,
        ignore_unknown_top_level: bool,
    ) -> Result<u64> {
        let mut reader = ByteReader::new(source);
        self.parse_reader(&mut reader, visitor, ignore_unknown_top_level)
    }

    /// Like [`parse`](Self::parse) but on a caller-owned reader, so the caller
    /// can keep reading after the container. Returns the reader's position.
    pub fn parse_reader<R: Read, V: Visitor + ?Sized>(
        &self,
        reader: &mut ByteReader<R>,
        visitor: &mut V,
        ignore_unknown_top_level: bool,
    ) -> Result<u64> {
        let mut run = ParseRun {
            registry: self.registry,
            options: &self.options,
            reader,
            visitor,
            visitor_failed: false,
        };
        run.parse_file(ignore_unknown_top_level)?;
        let consumed = run.reader.position();
        tracing::info!(bytes = consumed, "Parsed chunk stream");
        Ok(consumed)
    }
}

/// State of a single parse: the reader and visitor are borrowed for its
/// duration only.
struct ParseRun<'a, R, V: ?Sized> {
    registry: &'a Registry,
    options: &'a ParseOptions,
    reader: &'a mut ByteReader<R>,
    visitor: &'a mut V,
    /// Set once a visitor callback returns an error, so that error unwinds
    /// past every group instead of being taken for a parser recovery.
    visitor_failed: bool,
}

impl<R: Read, V: Visitor + ?Sized> ParseRun<'_, R, V> {
    fn parse_file(&mut self, ignore_unknown: bool) -> Result<()> {
        let offset = self.reader.position();
        self.reader.mark();
        let id = match self.reader.read_fourcc() {
            Ok(id) => id,
            Err(err) if ignore_unknown && err.is_recoverable() => {
                self.reader.reset();
                tracing::info!(offset, "Ignoring short tail at top level");
                return Ok(());
            }
            Err(err) => {
                self.reader.release_mark();
                return Err(err);
            }
        };

        if id == FourCC::RIFF {
            self.reader.release_mark();
            self.parse_group(None, id, offset, 0)?;
            return self.align_at_end();
        }

        if id.is_filler() {
            self.reader.release_mark();
            let size = self.read_size()?;
            tracing::debug!(id = %id, size, offset, "Skipping top-level filler");
            self.reader.skip_exact(size)?;
            return self.align_at_end();
        }

        if ignore_unknown {
            self.reader.reset();
            tracing::info!(id = %id, offset, "Ignoring unrecognized top-level id");
            return Ok(());
        }

        self.reader.release_mark();
        Err(RiffError::UnknownTopLevelId { offset, found: id })
    }

    /// A missing final pad byte at the very end of the stream is tolerated.
    fn align_at_end(&mut self) -> Result<()> {
        match self.reader.align() {
            Err(RiffError::EndOfStream { offset }) => {
                tracing::warn!(offset, "Stream ends without final pad byte");
                Ok(())
            }
            other => other,
        }
    }

    /// Record a visitor failure before handing the result back.
    fn checked(&mut self, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.visitor_failed = true;
        }
        result
    }

    fn read_size(&mut self) -> Result<u64> {
        self.reader
            .read_u32_as(self.options.byte_order)
            .map(u64::from)
    }

    /// Group production, entered after its `RIFF`/`LIST` id has been read.
    fn parse_group(
        &mut self,
        parent: Option<&Chunk>,
        id: FourCC,
        offset: u64,
        depth: usize,
    ) -> Result<()> {
        let size = self.read_size()?;
        if size < 4 {
            return Err(RiffError::MalformedLength { offset, id, size });
        }
        let body_start = self.reader.position();
        let sub_type = self.reader.read_fourcc()?;
        if !sub_type.is_group_type() {
            return Err(RiffError::UnsupportedSubType {
                offset: body_start,
                found: sub_type,
            });
        }

        let container_type = parent.and_then(Chunk::sub_type).unwrap_or(FourCC::NULL);
        let mut group = Chunk::parsed_group(container_type, id, sub_type, size, offset);
        if let Some(parent) = parent {
            group.inherit_from(parent);
        }

        let role = self.registry.classify(container_type, id);
        let reported = self.registry.reports_group(sub_type, id);
        tracing::debug!(
            id = %id,
            sub_type = %sub_type,
            size,
            offset,
            depth,
            role = ?role,
            reported,
            "Entering group"
        );

        if reported && !self.visitor.entering_group(&group) {
            tracing::debug!(sub_type = %sub_type, "Visitor skipped group body");
            return self.reader.skip_exact(size - 4);
        }

        if reported {
            let entered = self.visitor.enter_group(&group);
            self.checked(entered)?;
        }
        let body = self.parse_group_body(&mut group, body_start + size, depth);
        if !reported {
            body?;
            return self.pass_through_attachments(&group);
        }
        let left = self.visitor.leave_group(&group);
        let left = self.checked(left);
        body?;
        left
    }

    /// A group the visitor never sees hands its property and collection
    /// chunks to `visit_chunk`, in write order, once its body is parsed.
    fn pass_through_attachments(&mut self, group: &Chunk) -> Result<()> {
        for chunk in group.properties.values().chain(group.collections.iter()) {
            let visited = self.visitor.visit_chunk(group, chunk);
            self.checked(visited)?;
        }
        Ok(())
    }

    fn parse_group_body(&mut self, group: &mut Chunk, finish: u64, depth: usize) -> Result<()> {
        let body_start = finish - group.declared_size;
        while self.reader.position() < finish {
            match self.parse_child(group, finish, depth) {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) => break,
                Err(err) if err.is_recoverable() && !self.visitor_failed => {
                    let consumed = self.reader.position() - body_start;
                    tracing::warn!(
                        sub_type = ?group.sub_type(),
                        consumed,
                        declared = group.declared_size,
                        "Group truncated"
                    );
                    group.record_recovery(format!("unexpected end after {consumed} bytes"));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn parse_child(&mut self, group: &mut Chunk, finish: u64, depth: usize) -> Result<Step> {
        let offset = self.reader.position();
        let id = self.reader.read_fourcc()?;

        if id.is_group() {
            match self.parse_group(Some(&*group), id, offset, depth + 1) {
                Err(RiffError::MalformedLength { size, .. })
                    if depth > 0 && !self.visitor_failed =>
                {
                    let mut blob = id.to_bytes().to_vec();
                    let field = u32::try_from(size).unwrap_or(u32::MAX);
                    ByteWriter::new(&mut blob).write_u32_as(field, self.options.byte_order)?;
                    let reason = format!("malformed length {size} for '{id}' at offset {offset}");
                    self.capture_trailing(group, blob, finish, reason)?;
                    return Ok(Step::Finished);
                }
                other => other?,
            }
        } else if id.is_local_id() {
            self.parse_local(group, id, offset)?;
        } else if depth > 0 {
            let reason = format!("invalid chunk id '{id}' at offset {offset}");
            self.capture_trailing(group, id.to_bytes().to_vec(), finish, reason)?;
            return Ok(Step::Finished);
        } else {
            return Err(RiffError::InvalidChildId {
                offset,
                container: group.sub_type().unwrap_or(FourCC::NULL),
                found: id,
            });
        }

        self.reader.align()?;
        Ok(Step::Continue)
    }

    /// Local-chunk production, entered after its id has been read.
    fn parse_local(&mut self, group: &mut Chunk, id: FourCC, offset: u64) -> Result<()> {
        let size = self.read_size()?;
        let container_type = group.sub_type().unwrap_or(FourCC::NULL);
        let mut chunk = Chunk::parsed_local(container_type, id, size, offset);
        let role = self.registry.classify(container_type, id);

        tracing::debug!(
            id = %id,
            container = %container_type,
            size,
            offset,
            role = ?role,
            "Parsed chunk header"
        );

        if size > self.options.max_payload_len {
            tracing::warn!(
                id = %id,
                size,
                limit = self.options.max_payload_len,
                "Skipping oversized chunk body"
            );
            chunk.oversized = true;
            chunk.record_recovery(format!(
                "declared size {size} exceeds limit {}; body skipped",
                self.options.max_payload_len
            ));
            self.reader.skip_exact(size)?;
        }

        match role {
            // Group ids never reach the local production.
            Role::Data | Role::Group => {
                self.read_payload(&mut chunk)?;
                let visited = self.visitor.visit_chunk(group, &chunk);
                self.checked(visited)?;
            }
            Role::Property => {
                self.read_payload(&mut chunk)?;
                group.properties.insert(id, chunk);
            }
            Role::Collection => {
                self.read_payload(&mut chunk)?;
                group.collections.push(chunk);
            }
            Role::Stop => {
                if !chunk.oversized {
                    self.reader.skip_exact(size)?;
                }
                if self.options.visit_stop_chunks {
                    let visited = self.visitor.visit_chunk(group, &chunk);
                    self.checked(visited)?;
                }
            }
        }
        Ok(())
    }

    fn read_payload(&mut self, chunk: &mut Chunk) -> Result<()> {
        if !chunk.oversized {
            chunk.payload = Some(self.reader.read_exact(chunk.declared_size)?);
        }
        Ok(())
    }

    /// Keep everything from the offending header to the end of the list as
    /// opaque bytes. `blob` holds the header bytes already read.
    fn capture_trailing(
        &mut self,
        group: &mut Chunk,
        mut blob: Vec<u8>,
        finish: u64,
        reason: String,
    ) -> Result<()> {
        let remaining = finish.saturating_sub(self.reader.position());
        blob.extend(self.reader.read_up_to(remaining)?);

        let note = format!("{reason}; captured {} trailing bytes", blob.len());
        tracing::warn!(sub_type = ?group.sub_type(), "{}", note);
        group.trailing = Some(blob);
        group.record_recovery(note);
        Ok(())
    }
}
