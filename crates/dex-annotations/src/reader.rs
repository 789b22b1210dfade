//! Byte cursor over encoded annotation data
//!
//! All multi-byte payloads in the encoded value format are little-endian
//! and variable width, so the reader exposes width-parameterized reads
//! rather than fixed `u16`/`u32` accessors.

use crate::error::DecodeError;

/// Forward-only reader over an immutable annotation byte range.
///
/// The reader borrows the container's bytes and never copies them; it is
/// cheap to clone, which is how callers snapshot a position.
#[derive(Debug, Clone, Copy)]
pub struct EncodedReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> EncodedReader<'a> {
    /// Create a reader positioned at the start of `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Create a reader positioned at `position`
    pub fn at(buffer: &'a [u8], position: usize) -> Self {
        Self { buffer, position }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// The underlying buffer
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Bytes from the current position to the end of the buffer
    pub fn rest(&self) -> &'a [u8] {
        &self.buffer[self.position.min(self.buffer.len())..]
    }

    // ===== Basic Reading =====

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let value = *self
            .buffer
            .get(self.position)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        self.position += 1;
        Ok(value)
    }

    /// Read an unsigned LEB128 value of at most five bytes
    pub fn read_uleb128(&mut self) -> Result<u32, DecodeError> {
        let start = self.position;
        let mut result: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7f).wrapping_shl(shift);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::MalformedLeb128(start))
    }

    /// Advance past `count` bytes
    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        self.position += count;
        Ok(())
    }

    // ===== Sized Payloads =====

    /// Read `width` little-endian bytes, zero-extended to 64 bits
    pub fn read_unsigned(&mut self, width: usize) -> Result<u64, DecodeError> {
        debug_assert!((1..=8).contains(&width));
        if width > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let bytes = &self.buffer[self.position..self.position + width];
        let value = bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        self.position += width;
        Ok(value)
    }

    /// Read `width` little-endian bytes, sign-extended to 64 bits
    pub fn read_signed(&mut self, width: usize) -> Result<i64, DecodeError> {
        let shift = 64 - 8 * width as u32;
        let value = self.read_unsigned(width)?;
        Ok(((value << shift) as i64) >> shift)
    }

    /// Read `width` bytes as the most significant bytes of a
    /// `full_width`-byte bit pattern, filling the low bytes with zeros
    pub fn read_right_justified(
        &mut self,
        width: usize,
        full_width: usize,
    ) -> Result<u64, DecodeError> {
        debug_assert!(width <= full_width);
        let value = self.read_unsigned(width)?;
        Ok(value << (8 * (full_width - width)))
    }
}
