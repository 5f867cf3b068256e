//! Binary reader for bounds-checked parsing of byte slices.
//!
//! Archives are memory-mapped (or held as owned buffers when nested inside
//! another archive), so every decoder reads through [`BinaryReader`], a
//! cursor that never reads past the end of its slice and never zero-fills.

use std::borrow::Cow;
use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// How on-disk string bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEncoding {
    /// 7-bit ASCII; bytes above 0x7F decode to U+FFFD.
    #[default]
    Ascii,
    /// Strict UTF-8.
    Utf8,
}

impl StringEncoding {
    /// Decode raw bytes using this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<Cow<'_, str>> {
        match self {
            StringEncoding::Ascii if bytes.is_ascii() => {
                // ASCII is valid UTF-8
                Ok(Cow::Borrowed(std::str::from_utf8(bytes)?))
            }
            StringEncoding::Ascii => Ok(Cow::Owned(
                bytes
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                    .collect(),
            )),
            StringEncoding::Utf8 => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
        }
    }
}

/// A bounds-checked binary reader over a byte slice.
///
/// Integer reads are little-endian unless the method name ends in `_be`;
/// formats that mix byte orders pick one per call.
///
/// # Example
///
/// ```
/// use pakscope_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x2A];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32_be().unwrap(), 42);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The whole underlying buffer.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Seek to an absolute position. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        match usize::try_from(position) {
            Ok(pos) if pos <= self.data.len() => {
                self.position = pos;
                Ok(())
            }
            _ => Err(Error::SeekOutOfBounds {
                target: position,
                len: self.data.len(),
            }),
        }
    }

    /// Advance the position by a number of bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        if count > self.remaining() {
            return Err(self.eof(count));
        }
        self.position += count;
        Ok(())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Borrow an absolute byte range without moving the cursor.
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let start = usize::try_from(offset).map_err(|_| Error::SeekOutOfBounds {
            target: offset,
            len: self.data.len(),
        })?;
        let count = usize::try_from(len).unwrap_or(usize::MAX);
        if start > self.data.len() {
            return Err(Error::SeekOutOfBounds {
                target: offset,
                len: self.data.len(),
            });
        }
        if count > self.data.len() - start {
            return Err(Error::UnexpectedEof {
                position: start,
                needed: count,
                available: self.data.len() - start,
            });
        }
        Ok(&self.data[start..start + count])
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(self.eof(count));
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read exactly `count` bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_bytes(2).map(LittleEndian::read_i16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes(4).map(LittleEndian::read_i32)
    }

    /// Read a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_bytes(8).map(LittleEndian::read_u64)
    }

    /// Read a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_bytes(8).map(LittleEndian::read_i64)
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes(4).map(LittleEndian::read_f32)
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read_bytes(2).map(BigEndian::read_u16)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_bytes(4).map(BigEndian::read_u32)
    }

    /// Read a big-endian i32.
    #[inline]
    pub fn read_i32_be(&mut self) -> Result<i32> {
        self.read_bytes(4).map(BigEndian::read_i32)
    }

    /// Read a big-endian u64.
    #[inline]
    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.read_bytes(8).map(BigEndian::read_u64)
    }

    /// Read a null-terminated string. The terminator is consumed.
    pub fn read_cstring(&mut self, encoding: StringEncoding) -> Result<Cow<'a, str>> {
        let start = self.position;
        let remaining = self.remaining_bytes();

        let null_pos =
            memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator(start))?;

        self.position = start + null_pos + 1;
        encoding.decode(&remaining[..null_pos])
    }

    /// Read a string of exactly `length` bytes.
    pub fn read_string(&mut self, length: usize, encoding: StringEncoding) -> Result<Cow<'a, str>> {
        let bytes = self.read_bytes(length)?;
        encoding.decode(bytes)
    }

    /// Read a string from a fixed-size buffer, stopping at the first null.
    pub fn read_string_in_buffer(
        &mut self,
        buffer_size: usize,
        encoding: StringEncoding,
    ) -> Result<Cow<'a, str>> {
        let bytes = self.read_bytes(buffer_size)?;
        let end = memchr::memchr(0, bytes).unwrap_or(buffer_size);
        encoding.decode(&bytes[..end])
    }

    /// Read a string prefixed by a one-byte length.
    pub fn read_l8_string(&mut self, encoding: StringEncoding) -> Result<Cow<'a, str>> {
        let length = self.read_u8()? as usize;
        self.read_string(length, encoding)
    }

    /// Read a string prefixed by a little-endian u32 length. Zero length is empty.
    pub fn read_l32_string(&mut self, encoding: StringEncoding) -> Result<Cow<'a, str>> {
        let length = self.read_u32()? as usize;
        self.read_string(length, encoding)
    }

    /// Read a string prefixed by a 7-bit encoded length.
    pub fn read_7bit_string(&mut self, encoding: StringEncoding) -> Result<Cow<'a, str>> {
        let length = self.read_7bit_length()?;
        self.read_string(length, encoding)
    }

    /// Read a length stored in 7-bit chunks, low bits first, high bit = continue.
    pub fn read_7bit_length(&mut self) -> Result<usize> {
        let start = self.position;
        let mut value = 0usize;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as usize) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        self.position = start;
        Err(Error::InvalidVarint(start))
    }

    /// Read a struct using zerocopy.
    ///
    /// Field widths and byte order come from the struct's declaration, so a
    /// layout using `U32<BigEndian>` fields reads big-endian regardless of host.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let position = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            position,
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read `count` consecutive structs.
    pub fn read_struct_array<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let size = std::mem::size_of::<T>();
        let total = size.checked_mul(count).ok_or_else(|| self.eof(usize::MAX))?;
        if total > self.remaining() {
            return Err(self.eof(total));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_struct::<T>()?);
        }
        Ok(items)
    }

    /// Peek at a little-endian u32 without advancing.
    #[inline]
    pub fn peek_u32(&self) -> Result<u32> {
        self.peek_bytes(4).map(LittleEndian::read_u32)
    }

    /// Expect a specific value or return an error.
    pub fn expect<T: PartialEq + std::fmt::Debug + FromBytes>(&mut self, expected: T) -> Result<()> {
        let actual = self.read_struct::<T>()?;
        if actual != expected {
            return Err(Error::ExpectedValue {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            });
        }
        Ok(())
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let position = self.position;
        let actual = self.peek_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                position,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        self.position += expected.len();
        Ok(())
    }

    fn eof(&self, needed: usize) -> Error {
        Error::UnexpectedEof {
            position: self.position,
            needed,
            available: self.remaining(),
        }
    }
}

impl Read for BinaryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining_bytes();
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}
