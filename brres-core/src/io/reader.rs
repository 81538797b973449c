//! Bounds-checked big-endian reader over a borrowed byte slice.
//!
//! Every multi-byte read on GameCube/Wii archives is big-endian; this
//! mirrors the manual `u32::from_be_bytes`/`u16::from_be_bytes` style used
//! for the GCFS table-of-contents parser, but centralizes the bounds check
//! so callers don't each hand-roll one. The `_le` methods read the same
//! fields little-endian, for host-only caches that never touch a console.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("unexpected end of buffer: wanted {wanted} byte(s) at offset {offset}, buffer is {len} byte(s)")]
    Eof {
        offset: usize,
        wanted: usize,
        len: usize,
    },

    #[error("seek target {target} is out of bounds for a buffer of {len} byte(s)")]
    SeekOutOfBounds { target: usize, len: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("string at offset {offset} has no terminating NUL within {limit} byte(s)")]
    UnterminatedString { offset: usize, limit: usize },
}

/// A cursor over a borrowed buffer. Every read advances `pos` and fails
/// with [`ReaderError::Eof`] instead of panicking when the buffer is short.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, offset: usize) -> Result<(), ReaderError> {
        if offset > self.buf.len() {
            return Err(ReaderError::SeekOutOfBounds {
                target: offset,
                len: self.buf.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ReaderError> {
        self.seek(self.pos + count)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if self.pos + n > self.buf.len() {
            return Err(ReaderError::Eof {
                offset: self.pos,
                wanted: n,
                len: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, ReaderError> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16, ReaderError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, ReaderError> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> Result<u32, ReaderError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32, ReaderError> {
        Ok(self.u32()? as i32)
    }

    pub fn f32(&mut self) -> Result<f32, ReaderError> {
        Ok(f32::from_bits(self.u32()?))
    }

    pub fn u16_le(&mut self) -> Result<u16, ReaderError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16_le(&mut self) -> Result<i16, ReaderError> {
        Ok(self.u16_le()? as i16)
    }

    pub fn u32_le(&mut self) -> Result<u32, ReaderError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32_le(&mut self) -> Result<i32, ReaderError> {
        Ok(self.u32_le()? as i32)
    }

    pub fn f32_le(&mut self) -> Result<f32, ReaderError> {
        Ok(f32::from_bits(self.u32_le()?))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        self.take(n)
    }

    /// Reads a fixed-length array without advancing past a short read.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], ReaderError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Reads a NUL-terminated string starting at the current position,
    /// bounded by `limit` bytes so a corrupt archive can't run the scan
    /// unbounded.
    pub fn cstr(&mut self, limit: usize) -> Result<String, ReaderError> {
        let start = self.pos;
        let end = (start + limit).min(self.buf.len());
        let window = &self.buf[start..end];
        let nul = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(ReaderError::UnterminatedString {
                offset: start,
                limit,
            })?;
        let s = std::str::from_utf8(&window[..nul])
            .map_err(|_| ReaderError::InvalidUtf8 { offset: start })?
            .to_owned();
        self.pos = start + nul + 1;
        Ok(s)
    }

    /// Reads a string at `offset` without disturbing the cursor, per the
    /// name-table convention of storing relative offsets that are resolved
    /// on demand rather than inline.
    pub fn cstr_at(&self, offset: usize, limit: usize) -> Result<String, ReaderError> {
        let mut scratch = Reader::new(self.buf);
        scratch.seek(offset)?;
        scratch.cstr(limit)
    }

    /// Runs `f` with the cursor temporarily moved to `offset`, restoring the
    /// original position afterward regardless of whether `f` errors. This is
    /// the "jump and come back" pattern used throughout the BRRES container
    /// format, where a header holds an offset to a block parsed out of line.
    pub fn jump<T>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Reader<'a>) -> Result<T, ReaderError>,
    ) -> Result<T, ReaderError> {
        let saved = self.pos;
        self.seek(offset)?;
        let result = f(self);
        self.pos = saved;
        result
    }

    /// Wraps `f`'s error, if any, with the name of the section being parsed.
    /// Used to build a breadcrumb like `"mat[3].tev: unexpected end of
    /// buffer"` without threading a context string through every call site.
    pub fn scoped<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Reader<'a>) -> Result<T, ReaderError>,
    ) -> Result<T, ScopedReaderError> {
        f(self).map_err(|source| ScopedReaderError {
            scope: name.to_owned(),
            source,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{scope}: {source}")]
pub struct ScopedReaderError {
    pub scope: String,
    #[source]
    pub source: ReaderError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
        let mut r = Reader::new(&buf);
        assert_eq!(r.u16().unwrap(), 1);
        assert_eq!(r.u32().unwrap(), 2);
    }

    #[test]
    fn reads_little_endian_primitives() {
        let buf = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut r = Reader::new(&buf);
        assert_eq!(r.u16_le().unwrap(), 1);
        assert_eq!(r.u32_le().unwrap(), 2);
    }

    #[test]
    fn eof_reports_offset_and_want() {
        let buf = [0u8; 2];
        let mut r = Reader::new(&buf);
        let err = r.u32().unwrap_err();
        assert_eq!(
            err,
            ReaderError::Eof {
                offset: 0,
                wanted: 4,
                len: 2
            }
        );
    }

    #[test]
    fn jump_restores_position() {
        let buf = [1, 2, 3, 4, 5];
        let mut r = Reader::new(&buf);
        r.skip(1).unwrap();
        let byte = r.jump(4, |r| r.u8()).unwrap();
        assert_eq!(byte, 5);
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn cstr_reads_until_nul_and_bounds_the_scan() {
        let buf = b"hello\0garbage";
        let mut r = Reader::new(buf);
        assert_eq!(r.cstr(64).unwrap(), "hello");
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn cstr_without_nul_within_limit_errors() {
        let buf = b"no_terminator_here";
        let mut r = Reader::new(buf);
        let err = r.cstr(4).unwrap_err();
        assert_eq!(
            err,
            ReaderError::UnterminatedString { offset: 0, limit: 4 }
        );
    }

    #[test]
    fn scoped_wraps_error_with_breadcrumb() {
        let buf = [0u8; 1];
        let mut r = Reader::new(&buf);
        let err = r.scoped("mat[3].tev", |r| r.u32()).unwrap_err();
        assert_eq!(err.scope, "mat[3].tev");
    }
}
