use bytes::Bytes;

use crate::error::{EbtError, Result};

/// An immutable, reference-counted flat byte buffer holding a translated
/// rule-set. Cheap to clone (shares the backing allocation); this is what
/// [`crate::classifier`] hot-swaps via `ArcSwap` on install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(Bytes);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Blob(Bytes::from(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A bounds-checked cursor over this blob starting at `offset`.
    pub fn cursor_at(&self, offset: usize) -> Result<BlobReader<'_>> {
        if offset > self.0.len() {
            return Err(EbtError::Corrupt(format!(
                "offset {offset} past end of blob ({} bytes)",
                self.0.len()
            )));
        }
        Ok(BlobReader { buf: &self.0, pos: offset })
    }
}

/// A forward-only, bounds-checked reader over a [`Blob`]'s bytes. Every
/// primitive read advances `pos` and returns `Corrupt` rather than
/// panicking when the buffer is exhausted — untrusted blobs (e.g. loaded
/// from an atomic file written by a different version) must never panic
/// the process.
pub struct BlobReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(EbtError::Corrupt(format!(
                "need {n} bytes at offset {}, only {} remaining",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// `ethproto` is the one field the wire format stores in network
    /// (big-endian) byte order, mirroring `htons(e->ethproto)` in
    /// `ebtables_u.h`; every other fixed field is little-endian.
    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_array6(&mut self) -> Result<[u8; 6]> {
        let b = self.take(6)?;
        Ok(b.try_into().unwrap())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_utf8(&mut self, n: usize) -> Result<String> {
        let b = self.take(n)?;
        String::from_utf8(b.to_vec())
            .map_err(|_| EbtError::Corrupt("name field is not valid UTF-8".to_string()))
    }

    /// Seek to an absolute offset within the same underlying buffer,
    /// bounds-checked.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.buf.len() {
            return Err(EbtError::Corrupt(format!(
                "seek to {offset} past end of blob ({} bytes)",
                self.buf.len()
            )));
        }
        self.pos = offset;
        Ok(())
    }
}

/// An append-only byte buffer used while translating a graph into a
/// [`Blob`]. Tracks the write position so callers can record self-relative
/// offsets (e.g. an entry's `next_offset`) as they go.
#[derive(Debug, Default)]
pub struct BlobWriter {
    buf: Vec<u8>,
}

impl BlobWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// See [`BlobReader::read_u16_be`]: `ethproto` alone is big-endian.
    pub fn write_u16_be(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Overwrite 4 bytes already written at `offset` with `v`, used to
    /// backpatch a `next_offset`/length field once its true value is known.
    pub fn patch_u32(&mut self, offset: usize, v: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn finish(self) -> Blob {
        Blob::new(self.buf)
    }
}
