//! The in-memory chunk node used for both parsing and writing.
//!
//! A [`Chunk`] is either a *local* chunk (id + payload) or a *group*
//! (`RIFF`/`LIST` + sub-type + children). Groups also carry the property and
//! collection chunks the parser attached to them.
//!
//! Layout on the wire:
//! - local: `id(4) size(4) payload(size) [pad]`
//! - group: `RIFF|LIST(4) size(4) sub_type(4) children...`
//!
//! Sizes are never cached for writing: [`Chunk::encoded_size`] recomputes them
//! from the payload and children every time.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::fourcc::FourCC;
use crate::reader::Endian;
use crate::writer::ByteWriter;

/// Bytes taken by an id and a length field.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// One chunk of a container, parsed or about to be written.
///
/// Equality compares what would be serialized (ids, sub-type, payload,
/// children, attachments, trailing bytes). Parse bookkeeping such as the
/// stream offset, the declared size, notes and inherited properties is
/// ignored, so a tree built in memory equals the same tree parsed back.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Sub-type of the enclosing group, or [`FourCC::NULL`] at top level.
    pub(crate) container_type: FourCC,
    pub(crate) id: FourCC,
    /// `Some` for groups.
    pub(crate) sub_type: Option<FourCC>,
    pub(crate) declared_size: u64,
    pub(crate) offset: u64,
    pub(crate) payload: Option<Vec<u8>>,
    pub(crate) children: Vec<Chunk>,
    pub(crate) properties: BTreeMap<FourCC, Chunk>,
    pub(crate) inherited: BTreeMap<FourCC, Chunk>,
    pub(crate) collections: Vec<Chunk>,
    pub(crate) trailing: Option<Vec<u8>>,
    pub(crate) note: Option<String>,
    pub(crate) oversized: bool,
    pub(crate) had_recovery: bool,
}

impl Chunk {
    fn blank(container_type: FourCC, id: FourCC, sub_type: Option<FourCC>) -> Self {
        Self {
            container_type,
            id,
            sub_type,
            declared_size: 0,
            offset: 0,
            payload: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            inherited: BTreeMap::new(),
            collections: Vec::new(),
            trailing: None,
            note: None,
            oversized: false,
            had_recovery: false,
        }
    }

    /// A local chunk holding `payload`.
    pub fn local(id: FourCC, payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        let mut chunk = Self::blank(FourCC::NULL, id, None);
        chunk.declared_size = payload.len() as u64;
        chunk.payload = Some(payload);
        chunk
    }

    /// The outermost `RIFF` group.
    pub fn riff(sub_type: FourCC) -> Self {
        Self::blank(FourCC::NULL, FourCC::RIFF, Some(sub_type))
    }

    /// A nested `LIST` group.
    pub fn list(sub_type: FourCC) -> Self {
        Self::blank(FourCC::NULL, FourCC::LIST, Some(sub_type))
    }

    /// Header-only node for a group found while parsing.
    pub(crate) fn parsed_group(
        container_type: FourCC,
        id: FourCC,
        sub_type: FourCC,
        declared_size: u64,
        offset: u64,
    ) -> Self {
        let mut chunk = Self::blank(container_type, id, Some(sub_type));
        chunk.declared_size = declared_size;
        chunk.offset = offset;
        chunk
    }

    /// Header-only node for a local chunk found while parsing.
    pub(crate) fn parsed_local(
        container_type: FourCC,
        id: FourCC,
        declared_size: u64,
        offset: u64,
    ) -> Self {
        let mut chunk = Self::blank(container_type, id, None);
        chunk.declared_size = declared_size;
        chunk.offset = offset;
        chunk
    }

    // ---------------------------------------------------------------
    // Building
    // ---------------------------------------------------------------

    /// Append a structural child. The child's container type becomes this
    /// group's sub-type.
    pub fn push(&mut self, mut child: Chunk) -> &mut Self {
        child.container_type = self.container_key();
        self.children.push(child);
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_child(mut self, child: Chunk) -> Self {
        self.push(child);
        self
    }

    /// Attach a property chunk, replacing any previous one with the same id.
    pub fn set_property(&mut self, mut chunk: Chunk) -> &mut Self {
        chunk.container_type = self.container_key();
        self.properties.insert(chunk.id, chunk);
        self
    }

    /// Append a collection chunk. Duplicates are kept in insertion order.
    pub fn add_collection(&mut self, mut chunk: Chunk) -> &mut Self {
        chunk.container_type = self.container_key();
        self.collections.push(chunk);
        self
    }

    /// Replace the local payload.
    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) -> &mut Self {
        let payload = payload.into();
        self.declared_size = payload.len() as u64;
        self.payload = Some(payload);
        self
    }

    /// Key children are classified under: the sub-type for groups.
    fn container_key(&self) -> FourCC {
        self.sub_type.unwrap_or(self.id)
    }

    /// Copy the enclosing group's visible properties as inherited ones.
    pub(crate) fn inherit_from(&mut self, parent: &Chunk) {
        self.inherited = parent.inherited.clone();
        for (id, chunk) in &parent.properties {
            self.inherited.insert(*id, chunk.clone());
        }
    }

    /// Record a recovery diagnostic. Several notes are joined with `"; "`.
    pub(crate) fn record_recovery(&mut self, note: String) {
        self.had_recovery = true;
        self.note = Some(match self.note.take() {
            Some(previous) => format!("{previous}; {note}"),
            None => note,
        });
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> FourCC {
        self.id
    }

    /// Sub-type of the enclosing group ([`FourCC::NULL`] at top level).
    pub fn container_type(&self) -> FourCC {
        self.container_type
    }

    /// Sub-type of this group, `None` for local chunks.
    pub fn sub_type(&self) -> Option<FourCC> {
        self.sub_type
    }

    pub fn is_group(&self) -> bool {
        self.sub_type.is_some()
    }

    /// Length field as read from the stream (or the payload length for
    /// chunks built in memory).
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Absolute stream offset of the chunk header; zero for built chunks.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Payload bytes, `None` when the body was skipped.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn take_payload(&mut self) -> Option<Vec<u8>> {
        self.payload.take()
    }

    pub fn children(&self) -> &[Chunk] {
        &self.children
    }

    /// Property `id` of this group, falling back to inherited properties.
    pub fn property(&self, id: FourCC) -> Option<&Chunk> {
        self.properties.get(&id).or_else(|| self.inherited.get(&id))
    }

    /// Properties attached directly to this group, ordered by id.
    pub fn properties(&self) -> impl Iterator<Item = &Chunk> {
        self.properties.values()
    }

    /// Collection chunks with the given id, in insertion order.
    pub fn collection(&self, id: FourCC) -> impl Iterator<Item = &Chunk> {
        self.collections.iter().filter(move |c| c.id == id)
    }

    pub fn collections(&self) -> &[Chunk] {
        &self.collections
    }

    /// Raw bytes captured after a malformed child id.
    pub fn trailing(&self) -> Option<&[u8]> {
        self.trailing.as_deref()
    }

    /// Non-fatal diagnostic left by the parser.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// The declared length exceeded the payload limit; the body was skipped.
    pub fn oversized(&self) -> bool {
        self.oversized
    }

    /// The parser recovered from an error inside this node.
    pub fn had_recovery(&self) -> bool {
        self.had_recovery
    }

    // ---------------------------------------------------------------
    // Sizes and serialization
    // ---------------------------------------------------------------

    /// Value of the length field this chunk serializes with.
    ///
    /// For groups this is the sub-type plus every encoded child, property,
    /// collection and trailing byte. For local chunks without a payload the
    /// declared size stands in.
    pub fn payload_len(&self) -> u64 {
        if self.is_group() {
            4 + self
                .children
                .iter()
                .chain(self.properties.values())
                .chain(self.collections.iter())
                .map(Chunk::encoded_size)
                .sum::<u64>()
                + self.trailing.as_ref().map_or(0, |t| t.len() as u64)
        } else {
            self.payload
                .as_ref()
                .map_or(self.declared_size, |p| p.len() as u64)
        }
    }

    /// Total bytes [`write`](Self::write) emits: header, payload and pad.
    pub fn encoded_size(&self) -> u64 {
        let len = self.payload_len();
        CHUNK_HEADER_SIZE + len + len % 2
    }

    /// Serialize with little-endian length fields.
    pub fn write<W: Write>(&self, sink: W) -> io::Result<()> {
        self.write_as(sink, Endian::Little)
    }

    /// Serialize with the given byte order for length fields.
    pub fn write_as<W: Write>(&self, sink: W, endian: Endian) -> io::Result<()> {
        let mut writer = ByteWriter::new(sink);
        self.write_to(&mut writer, endian)?;
        tracing::debug!(
            id = %self.id,
            bytes = writer.position(),
            "Wrote chunk tree"
        );
        writer.flush()
    }

    fn write_to<W: Write>(&self, writer: &mut ByteWriter<W>, endian: Endian) -> io::Result<()> {
        let len = self.payload_len();
        let field = u32::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("chunk '{}' is {} bytes, above the 32-bit length limit", self.id, len),
            )
        })?;

        writer.write_fourcc(self.id)?;
        writer.write_u32_as(field, endian)?;

        if let Some(sub_type) = self.sub_type {
            writer.write_fourcc(sub_type)?;
            for child in self
                .children
                .iter()
                .chain(self.properties.values())
                .chain(self.collections.iter())
            {
                child.write_to(writer, endian)?;
            }
            if let Some(trailing) = &self.trailing {
                writer.write_bytes(trailing)?;
            }
        } else {
            let payload = self.payload.as_deref().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("body of chunk '{}' was never read", self.id),
                )
            })?;
            writer.write_bytes(payload)?;
        }

        writer.pad(len)
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.sub_type == other.sub_type
            && self.payload == other.payload
            && self.children == other.children
            && self.properties == other.properties
            && self.collections == other.collections
            && self.trailing == other.trailing
    }
}

impl Eq for Chunk {}
