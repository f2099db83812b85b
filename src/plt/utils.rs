//! Low-level byte reading utilities

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::plt::types::error::{PltError, Result};

/// A forward-moving read position over a fully buffered `.plt` image.
///
/// Every read is little-endian and bounds checked; running past the end
/// yields [`PltError::TruncatedInput`] carrying the offending offset.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Starts reading at an absolute offset, e.g. the header's data offset.
    pub fn at(data: &'a [u8], pos: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(pos)?;
        Ok(cursor)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(PltError::TruncatedInput {
                offset: self.data.len(),
                needed: pos - self.data.len(),
                available: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn check(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(PltError::TruncatedInput {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Returns the next `len` bytes and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes(4).map(LittleEndian::read_i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes(4).map(LittleEndian::read_f32)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_bytes(8).map(LittleEndian::read_f64)
    }

    /// Reads `count` little-endian `i32` values.
    pub fn read_i32_vec(&mut self, count: usize) -> Result<Vec<i32>> {
        let bytes = self.read_bytes(count.saturating_mul(4))?;
        let mut values = vec![0i32; count];
        LittleEndian::read_i32_into(bytes, &mut values);
        Ok(values)
    }

    /// Reads a Tecplot string: one 4-byte character code per character,
    /// terminated by a zero code that is consumed but not returned.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let mut text = String::new();
        loop {
            if self.remaining() < 4 {
                return Err(PltError::TruncatedInput {
                    offset: self.pos,
                    needed: 4,
                    available: self.remaining(),
                });
            }
            let code = self.read_i32()?;
            if code == 0 {
                break;
            }
            text.push(char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        trace!("Read string {:?} ({} bytes) at offset {}", text, self.pos - start, start);
        Ok(text)
    }
}

/// Little-endian image builder for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ByteWriter(pub Vec<u8>);

#[cfg(test)]
impl ByteWriter {
    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32s(self, vs: &[i32]) -> Self {
        vs.iter().fold(self, |w, &v| w.i32(v))
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32s(self, vs: &[f32]) -> Self {
        vs.iter().fold(self, |w, &v| w.f32(v))
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn string(self, s: &str) -> Self {
        s.chars().fold(self, |w, c| w.i32(c as i32)).i32(0)
    }

    /// Magic, byte order, full file type, title and variable names.
    pub fn header(magic: &[u8; 8], variables: &[&str]) -> Self {
        let w = ByteWriter(magic.to_vec()).i32(1).i32(0).string("test");
        variables
            .iter()
            .fold(w.i32(variables.len() as i32), |w, name| w.string(name))
    }

    /// A V112 ordered zone record, marker included.
    pub fn ordered_zone(self, name: &str, dims: [i32; 3], shared: &[i32]) -> Self {
        self.f32(299.0)
            .string(name)
            .i32(-1)
            .i32(0)
            .i32(0)
            .i32(0)
            .i32(0)
            .i32s(&dims)
            .f64(0.0)
            .i32(-1)
            .i32s(shared)
            .i32(-1)
            .i32(0)
    }
}
