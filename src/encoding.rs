//! Binary encoder/decoder for persisted fingerprints.
//!
//! The format uses LEB128 variable-length integers for counts and ordinals,
//! single bytes for booleans, length-prefixed byte blocks for strings, and
//! raw fixed-length blocks for digests. Decoding never panics: truncated or
//! malformed input surfaces as a [`DecodeError`] so the cache layer can
//! treat the entry as a miss.

use crate::error::DecodeError;
use crate::types::{Hash, HASH_LEN};
use std::io::{Read, Write};

/// Maximum number of bytes in a LEB128-encoded u64.
const MAX_VARINT_LEN: usize = 10;

/// Writes primitives to an underlying byte sink.
pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a small unsigned integer as a LEB128 varint.
    pub fn write_small_int(&mut self, mut value: u64) -> std::io::Result<()> {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.writer.write_all(&[byte])?;
            if value == 0 {
                return Ok(());
            }
        }
    }

    pub fn write_bool(&mut self, value: bool) -> std::io::Result<()> {
        self.writer.write_all(&[value as u8])
    }

    /// Write a length-prefixed byte block.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.write_small_int(bytes.len() as u64)?;
        self.writer.write_all(bytes)
    }

    pub fn write_string(&mut self, value: &str) -> std::io::Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write a digest as its raw fixed-length bytes.
    pub fn write_hash(&mut self, hash: &Hash) -> std::io::Result<()> {
        self.writer.write_all(hash)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Reads primitives from an underlying byte source.
pub struct Decoder<R: Read> {
    reader: R,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a LEB128 varint written by [`Encoder::write_small_int`].
    pub fn read_small_int(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        let mut shift = 0;
        for _ in 0..MAX_VARINT_LEN {
            let byte = self.read_byte()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
        Err(DecodeError::MalformedVarInt)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBoolean(other)),
        }
    }

    /// Read a length-prefixed byte block.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_small_int()? as usize;
        let mut bytes = Vec::new();
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut bytes)?;
        if read < len {
            return Err(DecodeError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("byte block truncated: expected {} bytes, got {}", len, read),
            )));
        }
        Ok(bytes)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.read_bytes()?)?)
    }

    pub fn read_hash(&mut self) -> Result<Hash, DecodeError> {
        let mut hash = [0u8; HASH_LEN];
        self.reader.read_exact(&mut hash)?;
        Ok(hash)
    }
}
