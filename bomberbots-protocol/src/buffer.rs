//! Pure big-endian cursor reader and writer.
//!
//! These are the only primitives the codec is built on. Neither touches
//! the network: [`Reader`] walks a borrowed byte slice and fails with
//! [`WireError::BadRead`] when the slice runs dry, [`Writer`] grows an
//! owned buffer and fails with [`WireError::BadWrite`] when an optional
//! hard capacity would be exceeded. Transports decide what those errors
//! mean (retry with more bytes, skip the datagram, close the stream).

use crate::error::{WireError, WireResult};
use crate::STRING_MAX;

/// Bounds-checked cursor over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `data`, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(WireError::BadRead);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> WireResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> WireResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> WireResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a `u8`-length-prefixed UTF-8 string.
    ///
    /// Non-UTF-8 payloads are malformed input, reported as `BadRead`.
    pub fn read_string(&mut self) -> WireResult<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::BadRead)
    }

    /// Reads a `u32` element count for a list or map.
    pub fn read_count(&mut self) -> WireResult<usize> {
        Ok(self.read_u32()? as usize)
    }
}

/// Growable output buffer with an optional hard capacity.
#[derive(Debug)]
pub struct Writer {
    data: Vec<u8>,
    capacity: Option<usize>,
}

impl Writer {
    /// Creates an unbounded writer (TCP: no per-message cap).
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(crate::TCP_BUFFER_SIZE),
            capacity: None,
        }
    }

    /// Creates a writer that refuses to grow past `capacity` bytes
    /// (UDP: one datagram).
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity: Some(capacity),
        }
    }

    fn reserve(&mut self, n: usize) -> WireResult<()> {
        if let Some(cap) = self.capacity {
            if self.data.len() + n > cap {
                return Err(WireError::BadWrite);
            }
        }
        Ok(())
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, value: u8) -> WireResult<()> {
        self.reserve(1)?;
        self.data.push(value);
        Ok(())
    }

    /// Writes a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) -> WireResult<()> {
        self.reserve(2)?;
        self.data.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Writes a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> WireResult<()> {
        self.reserve(4)?;
        self.data.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Writes a `u8`-length-prefixed string.
    ///
    /// Strings longer than [`STRING_MAX`] bytes cannot be represented and
    /// fail with `BadWrite`.
    pub fn write_string(&mut self, value: &str) -> WireResult<()> {
        if value.len() > STRING_MAX {
            return Err(WireError::BadWrite);
        }
        self.write_u8(value.len() as u8)?;
        self.reserve(value.len())?;
        self.data.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes a `u32` element count for a list or map.
    pub fn write_count(&mut self, count: usize) -> WireResult<()> {
        self.write_u32(count as u32)
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_big_endian() {
        let mut w = Writer::new();
        w.write_u8(0xAB).unwrap();
        w.write_u16(0x0102).unwrap();
        w.write_u32(0x0A0B0C0D).unwrap();
        let bytes = w.finish();
        assert_eq!(bytes, [0xAB, 0x01, 0x02, 0x0A, 0x0B, 0x0C, 0x0D]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.read_u16().unwrap(), 0x0102);
        assert_eq!(r.read_u32().unwrap(), 0x0A0B0C0D);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn string_roundtrip() {
        let mut w = Writer::new();
        w.write_string("alice").unwrap();
        let bytes = w.finish();
        assert_eq!(bytes, [5, b'a', b'l', b'i', b'c', b'e']);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_string().unwrap(), "alice");
    }

    #[test]
    fn oversize_string_is_bad_write() {
        let long = "x".repeat(256);
        let mut w = Writer::new();
        assert_eq!(w.write_string(&long), Err(WireError::BadWrite));
    }

    #[test]
    fn max_length_string_fits() {
        let long = "x".repeat(255);
        let mut w = Writer::new();
        w.write_string(&long).unwrap();
        assert_eq!(w.len(), 256);
    }

    #[test]
    fn short_input_is_bad_read() {
        let mut r = Reader::new(&[0x01]);
        assert_eq!(r.read_u16(), Err(WireError::BadRead));
        // Position is untouched by the failed read.
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u8().unwrap(), 1);
    }

    #[test]
    fn truncated_string_is_bad_read() {
        // Declares 5 bytes, provides 2.
        let mut r = Reader::new(&[5, b'a', b'b']);
        assert_eq!(r.read_string(), Err(WireError::BadRead));
    }

    #[test]
    fn invalid_utf8_is_bad_read() {
        let mut r = Reader::new(&[2, 0xFF, 0xFE]);
        assert_eq!(r.read_string(), Err(WireError::BadRead));
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let mut w = Writer::with_capacity_limit(3);
        w.write_u16(7).unwrap();
        assert_eq!(w.write_u16(7), Err(WireError::BadWrite));
        w.write_u8(1).unwrap();
        assert_eq!(w.write_u8(1), Err(WireError::BadWrite));
    }
}
