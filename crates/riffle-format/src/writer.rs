//! Position-tracking byte writer, the output counterpart of [`ByteReader`].
//!
//! [`Chunk::write`](crate::Chunk::write) drives a [`ByteWriter`] to emit
//! headers, payloads and pad bytes. Errors are plain [`std::io::Error`]s:
//! writing never needs the parse-specific error kinds.
//!
//! [`ByteReader`]: crate::ByteReader

use std::io::{self, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::fourcc::FourCC;
use crate::reader::Endian;

/// Sequential writer that tracks the number of bytes emitted.
#[derive(Debug)]
pub struct ByteWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    pub fn write_u16<E: ByteOrder>(&mut self, value: u16) -> io::Result<()> {
        self.inner.write_u16::<E>(value)?;
        self.position += 2;
        Ok(())
    }

    pub fn write_u32<E: ByteOrder>(&mut self, value: u32) -> io::Result<()> {
        self.inner.write_u32::<E>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a `u32` with a byte order chosen at runtime.
    pub fn write_u32_as(&mut self, value: u32, endian: Endian) -> io::Result<()> {
        match endian {
            Endian::Little => self.write_u32::<LittleEndian>(value),
            Endian::Big => self.write_u32::<BigEndian>(value),
        }
    }

    pub fn write_fourcc(&mut self, id: FourCC) -> io::Result<()> {
        self.write_u32::<BigEndian>(id.0)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Emit one zero pad byte if `len` is odd.
    pub fn pad(&mut self, len: u64) -> io::Result<()> {
        if len % 2 == 1 {
            self.write_u8(0)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
