//! Bounds-checked reading over a record buffer
//!
//! Every advance is validated against the end of the buffer before it
//! happens, so a failed read leaves the position unchanged.

use crate::error::{Result, TxfError};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

pub struct BoundedCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> BoundedCursor<'a> {
    /// Create a cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { inner: Cursor::new(data) }
    }

    /// Create a cursor at `offset`, which may equal the buffer length
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek("cursor offset", offset)?;
        Ok(cursor)
    }

    /// Create a cursor with nothing left to read
    pub fn at_end(data: &'a [u8]) -> Self {
        let mut cursor = Self::new(data);
        cursor.inner.set_position(data.len() as u64);
        cursor
    }

    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Total length of the underlying buffer
    pub fn limit(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn remaining(&self) -> usize {
        self.limit() - self.position()
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// The bytes from the current position to the end of the buffer
    pub fn rest(&self) -> &'a [u8] {
        let data: &'a [u8] = *self.inner.get_ref();
        &data[self.position()..]
    }

    /// Fail unless `size` more bytes are available
    pub fn ensure(&self, what: &'static str, size: usize) -> Result<()> {
        let position = self.position();
        match position.checked_add(size) {
            Some(end) if end <= self.limit() => Ok(()),
            _ => Err(TxfError::out_of_bounds(what, position, size, self.limit())),
        }
    }

    /// Move to an absolute offset within the buffer
    pub fn seek(&mut self, what: &'static str, offset: usize) -> Result<()> {
        if offset > self.limit() {
            return Err(TxfError::out_of_bounds(what, offset, 0, self.limit()));
        }
        self.inner.set_position(offset as u64);
        Ok(())
    }

    pub fn skip(&mut self, what: &'static str, size: usize) -> Result<()> {
        self.ensure(what, size)?;
        self.inner.set_position((self.position() + size) as u64);
        Ok(())
    }

    pub fn read_bytes(&mut self, what: &'static str, size: usize) -> Result<&'a [u8]> {
        self.ensure(what, size)?;
        let start = self.position();
        let data: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + size) as u64);
        Ok(&data[start..start + size])
    }

    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        self.ensure(what, N)?;
        let mut bytes = [0u8; N];
        self.inner.read_exact(&mut bytes).map_err(|_| self.short_read(what, N))?;
        Ok(bytes)
    }

    pub fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        self.ensure(what, 2)?;
        self.inner.read_u16::<LittleEndian>().map_err(|_| self.short_read(what, 2))
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        self.ensure(what, 4)?;
        self.inner.read_u32::<LittleEndian>().map_err(|_| self.short_read(what, 4))
    }

    pub fn read_u64(&mut self, what: &'static str) -> Result<u64> {
        self.ensure(what, 8)?;
        self.inner.read_u64::<LittleEndian>().map_err(|_| self.short_read(what, 8))
    }

    fn short_read(&self, what: &'static str, size: usize) -> TxfError {
        TxfError::out_of_bounds(what, self.position(), size, self.limit())
    }
}
