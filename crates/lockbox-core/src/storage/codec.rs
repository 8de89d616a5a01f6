//! Little-endian primitives for the store payload.
//!
//! Strings are written as an unsigned 7-bit variable-length byte count
//! (LEB128, low group first, high bit = continuation) followed by that many
//! UTF-8 bytes. This matches the layout .NET's `BinaryWriter.Write(string)`
//! produces, so payloads written by either side decode on the other.

use crate::error::{LockboxError, Result};

/// A 7-bit encoded 32-bit length never needs more than five bytes.
const MAX_VARINT_BYTES: usize = 5;

#[derive(Debug, Default)]
pub(crate) struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_str(&mut self, value: &str) {
        self.write_varint(value.len() as u64);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub(crate) struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        let mut array = [0u8; 4];
        array.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(array))
    }

    pub(crate) fn read_str(&mut self) -> Result<&'a str> {
        let len = self.read_varint()?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|_| malformed("string is not valid UTF-8"))
    }

    fn read_varint(&mut self) -> Result<usize> {
        let mut value: u64 = 0;
        for index in 0..MAX_VARINT_BYTES {
            let byte = self.take(1)?[0];
            value |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                if value > i32::MAX as u64 {
                    return Err(malformed("string length out of range"));
                }
                return Ok(value as usize);
            }
        }
        Err(malformed("string length prefix is too long"))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(malformed("unexpected end of payload"));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

pub(crate) fn malformed(reason: &str) -> LockboxError {
    LockboxError::MalformedStoreFile(reason.to_string())
}
