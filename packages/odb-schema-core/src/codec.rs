//! Binary stream primitives for persisted schema metadata.
//!
//! Integers are LEB128 varints (7 data bits per byte, high bit set on every
//! byte but the last). Strings and byte blobs carry a varint byte length
//! prefix. Booleans occupy one byte and must be 0 or 1.

use crate::error::SchemaError;

/// Maximum encoded length of a `u32` varint.
const MAX_VARINT32_LEN: usize = 5;

/// Maximum encoded length of a `u64` varint.
const MAX_VARINT64_LEN: usize = 10;

/// Append-only writer over an owned byte buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_varint_u32(&mut self, value: u32) {
        self.write_varint_u64(u64::from(value));
    }

    pub fn write_varint_u64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes a fixed four byte little-endian integer.
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a varint length followed by the UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_varint_u64(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    /// Writes bytes with no length prefix.
    pub fn write_bytes_raw(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }
}

/// Cursor over a borrowed byte slice.
///
/// Every read either consumes a complete value or fails without advancing
/// past the end of the input.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn read_u8(&mut self) -> Result<u8, SchemaError> {
        let byte = *self.buf.get(self.pos).ok_or(SchemaError::Truncated {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `len` bytes with no length prefix.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], SchemaError> {
        self.take(len)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SchemaError> {
        if self.remaining() < len {
            return Err(SchemaError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_varint_u64(&mut self) -> Result<u64, SchemaError> {
        let start = self.pos;
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT64_LEN {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7F);
            // The tenth byte may only contribute the single remaining bit.
            if i == MAX_VARINT64_LEN - 1 && bits > 1 {
                return Err(SchemaError::Malformed {
                    offset: start,
                    message: "varint overflows u64".to_string(),
                });
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(SchemaError::Malformed {
            offset: start,
            message: "varint longer than 10 bytes".to_string(),
        })
    }

    pub fn read_varint_u32(&mut self) -> Result<u32, SchemaError> {
        let start = self.pos;
        let value = self.read_varint_u64()?;
        if self.pos - start > MAX_VARINT32_LEN {
            return Err(SchemaError::Malformed {
                offset: start,
                message: "varint longer than 5 bytes for u32".to_string(),
            });
        }
        u32::try_from(value).map_err(|_| SchemaError::Malformed {
            offset: start,
            message: format!("varint {} overflows u32", value),
        })
    }

    pub fn read_bool(&mut self) -> Result<bool, SchemaError> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SchemaError::Malformed {
                offset,
                message: format!("invalid bool byte {:#04x}", other),
            }),
        }
    }

    pub fn read_u32_le(&mut self) -> Result<u32, SchemaError> {
        let bytes = self.take(4)?;
        let mut le = [0u8; 4];
        le.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(le))
    }

    /// Reads a length-prefixed byte blob no longer than `max_len`.
    pub fn read_bytes(&mut self, max_len: u32) -> Result<&'a [u8], SchemaError> {
        let len = self.read_varint_u64()?;
        if len > u64::from(max_len) {
            return Err(SchemaError::LimitExceeded {
                what: "byte length",
                value: len,
                limit: u64::from(max_len),
            });
        }
        // Bounded by max_len, which is a u32.
        self.take(len as usize)
    }

    /// Reads a length-prefixed UTF-8 string no longer than `max_len` bytes.
    pub fn read_string(&mut self, max_len: u32) -> Result<String, SchemaError> {
        let offset = self.pos;
        let bytes = self.read_bytes(max_len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| SchemaError::Malformed {
                offset,
                message: format!("invalid UTF-8 in string: {}", e),
            })
    }

    /// Reads a varint count and checks it against `limit`.
    pub fn read_count(&mut self, what: &'static str, limit: u32) -> Result<u32, SchemaError> {
        let count = self.read_varint_u32()?;
        if count > limit {
            return Err(SchemaError::LimitExceeded {
                what,
                value: u64::from(count),
                limit: u64::from(limit),
            });
        }
        Ok(count)
    }
}
