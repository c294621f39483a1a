//! Position-tracking byte reader used by the chunk parser.
//!
//! [`ByteReader`] wraps any [`Read`] source and keeps an absolute byte count
//! so that group end offsets and alignment can be computed without `Seek`.
//! Integer reads are delegated to `byteorder`, with the byte order chosen per
//! call because formats mix little- and big-endian fields.
//!
//! # Example
//!
//! ```rust
//! use byteorder::LittleEndian;
//! use riffle_format::ByteReader;
//!
//! let mut reader = ByteReader::new(&b"data\x03\x00\x00\x00"[..]);
//! assert_eq!(reader.read_fourcc().unwrap().to_string(), "data");
//! assert_eq!(reader.read_u32::<LittleEndian>().unwrap(), 3);
//! assert_eq!(reader.position(), 8);
//! ```

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiffError};
use crate::fourcc::FourCC;

/// Largest buffer reserved up front for a single bulk read. Larger payloads
/// grow as bytes actually arrive, so a lying length field on a short stream
/// cannot force a huge allocation.
const MAX_PREALLOCATION: u64 = 64 * 1024;

/// Byte order of length and numeric fields, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Bytes recorded since the last [`ByteReader::mark`].
#[derive(Debug)]
struct Mark {
    position: u64,
    recorded: Vec<u8>,
}

/// Sequential reader that tracks its absolute position.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
    mark: Option<Mark>,
    /// Bytes rewound by `reset` that must be served before `inner`.
    replay: Vec<u8>,
    replay_pos: usize,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            mark: None,
            replay: Vec::new(),
            replay_pos: 0,
        }
    }

    /// Absolute number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let offset = self.position;
        ReadBytesExt::read_u8(self).map_err(|e| eof_at(offset, e))
    }

    pub fn read_u16<E: ByteOrder>(&mut self) -> Result<u16> {
        let offset = self.position;
        ReadBytesExt::read_u16::<E>(self).map_err(|e| eof_at(offset, e))
    }

    pub fn read_i16<E: ByteOrder>(&mut self) -> Result<i16> {
        let offset = self.position;
        ReadBytesExt::read_i16::<E>(self).map_err(|e| eof_at(offset, e))
    }

    pub fn read_u32<E: ByteOrder>(&mut self) -> Result<u32> {
        let offset = self.position;
        ReadBytesExt::read_u32::<E>(self).map_err(|e| eof_at(offset, e))
    }

    pub fn read_i32<E: ByteOrder>(&mut self) -> Result<i32> {
        let offset = self.position;
        ReadBytesExt::read_i32::<E>(self).map_err(|e| eof_at(offset, e))
    }

    /// Read a `u32` with a byte order chosen at runtime.
    pub fn read_u32_as(&mut self, endian: Endian) -> Result<u32> {
        match endian {
            Endian::Little => self.read_u32::<LittleEndian>(),
            Endian::Big => self.read_u32::<BigEndian>(),
        }
    }

    /// Read a chunk code. Codes are always big-endian so they read left to right.
    pub fn read_fourcc(&mut self) -> Result<FourCC> {
        self.read_u32::<BigEndian>().map(FourCC)
    }

    /// Read exactly `len` bytes.
    pub fn read_exact(&mut self, len: u64) -> Result<Vec<u8>> {
        let offset = self.position;
        let buf = self.read_up_to(len)?;
        if (buf.len() as u64) < len {
            return Err(RiffError::EndOfStream { offset });
        }
        Ok(buf)
    }

    /// Read at most `len` bytes, stopping early at the end of the source.
    pub fn read_up_to(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOCATION) as usize);
        Read::by_ref(self).take(len).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Discard exactly `len` bytes without keeping them.
    pub fn skip_exact(&mut self, len: u64) -> Result<()> {
        let offset = self.position;
        let skipped = io::copy(&mut Read::by_ref(self).take(len), &mut io::sink())?;
        if skipped < len {
            return Err(RiffError::EndOfStream { offset });
        }
        Ok(())
    }

    /// Consume one pad byte if the position is odd.
    pub fn align(&mut self) -> Result<()> {
        if self.position % 2 == 1 {
            self.read_u8()?;
        }
        Ok(())
    }

    /// Start recording so that [`reset`](Self::reset) can rewind to here.
    /// Only one mark is kept; marking again moves it.
    pub fn mark(&mut self) {
        self.mark = Some(Mark {
            position: self.position,
            recorded: Vec::new(),
        });
    }

    /// Drop the current mark without rewinding.
    pub fn release_mark(&mut self) {
        self.mark = None;
    }

    /// Rewind to the last mark. Returns `false` if no mark was set.
    pub fn reset(&mut self) -> bool {
        let Some(mark) = self.mark.take() else {
            return false;
        };
        let mut replay = mark.recorded;
        replay.extend_from_slice(&self.replay[self.replay_pos..]);
        self.replay = replay;
        self.replay_pos = 0;
        self.position = mark.position;
        true
    }
}

impl<R: Read> Read for ByteReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = if self.replay_pos < self.replay.len() {
            let pending = &self.replay[self.replay_pos..];
            let n = pending.len().min(buf.len());
            buf[..n].copy_from_slice(&pending[..n]);
            self.replay_pos += n;
            if self.replay_pos == self.replay.len() {
                self.replay.clear();
                self.replay_pos = 0;
            }
            n
        } else {
            self.inner.read(buf)?
        };
        if let Some(mark) = self.mark.as_mut() {
            mark.recorded.extend_from_slice(&buf[..n]);
        }
        self.position += n as u64;
        Ok(n)
    }
}

/// Map a short read to [`RiffError::EndOfStream`] at the field's start offset.
fn eof_at(offset: u64, err: io::Error) -> RiffError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        RiffError::EndOfStream { offset }
    } else {
        RiffError::Io(err)
    }
}
