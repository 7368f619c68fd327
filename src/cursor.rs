//! Sequential little-endian reader over a received message.
//!
//! Every read is bounds-checked and fails with [`RemoteError::Truncated`]
//! instead of clamping, so a short message can never yield partial values.

use crate::{RemoteError, Result};

const U8_MAX: f32 = 255.0;
const I16_MAX: f32 = 32767.0;

/// Cursor over a fixed byte buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(RemoteError::truncated(self.offset, len, available));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Advance past `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a byte as a normalized channel value in `[0, 1]`.
    pub fn read_quantized_u8(&mut self) -> Result<f32> {
        Ok(quantized_u8(self.read_u8()?))
    }

    /// Read a signed 16-bit pixel coordinate, unscaled.
    pub fn read_position_i16(&mut self) -> Result<f32> {
        Ok(f32::from(self.read_i16()?))
    }

    /// Read a signed 16-bit value scaled to roughly `[-1, 1]`.
    pub fn read_normalized_i16(&mut self) -> Result<f32> {
        Ok(normalized_i16(self.read_i16()?))
    }
}

/// Convert a quantized channel byte to `[0, 1]`.
#[inline]
pub fn quantized_u8(value: u8) -> f32 {
    f32::from(value) / U8_MAX
}

/// Convert a quantized signed value to roughly `[-1, 1]`.
#[inline]
pub fn normalized_i16(value: i16) -> f32 {
    f32::from(value) / I16_MAX
}
