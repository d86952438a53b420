use crate::error::{Error, Result};
use crate::tag::Tag;

/// Byte order used for multi-byte reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

macro_rules! read_scalar {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(self.read_bytes(std::mem::size_of::<$ty>())?);
                Ok(match self.endian {
                    Endian::Little => <$ty>::from_le_bytes(buf),
                    Endian::Big => <$ty>::from_be_bytes(buf),
                })
            }
        )*
    };
}

macro_rules! write_scalar {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) {
                match self.endian {
                    Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                    Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
                }
            }
        )*
    };
}

/// Read cursor over a fully loaded byte slice.
///
/// Reads use the cursor's current [`Endian`] mode, little-endian unless
/// changed. Temporary changes go through [`Cursor::with_endian`].
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            endian: Endian::Little,
        }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Run `f` with the byte order switched to `endian`.
    ///
    /// The previous mode is restored whether `f` succeeds or fails.
    pub fn with_endian<T>(&mut self, endian: Endian, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = std::mem::replace(&mut self.endian, endian);
        let result = f(self);
        self.endian = saved;
        result
    }

    /// Skip `n` bytes of inert padding.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Fail with `TruncatedStream` unless `n` more bytes are available.
    pub fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::TruncatedStream {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a byte-reversed four-character code.
    pub fn read_tag(&mut self) -> Result<Tag> {
        Ok(Tag::from_disk(self.read_array()?))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    read_scalar! {
        read_i16 => i16,
        read_u16 => u16,
        read_i32 => i32,
        read_u32 => u32,
        read_f32 => f32,
    }

    /// Read `n` bytes as Latin-1 text.
    pub fn read_latin1(&mut self, n: usize) -> Result<String> {
        Ok(latin1_decode(self.read_bytes(n)?))
    }
}

/// Latin-1 decode. Total: every byte is one char.
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Latin-1 encode, or `None` if a char is above U+00FF.
pub fn latin1_encode(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|ch| u8::try_from(ch).ok()).collect()
}

/// Writer that builds a byte buffer, mirroring [`Cursor`].
pub struct Writer {
    buf: Vec<u8>,
    endian: Endian,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            endian: Endian::Little,
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            endian: Endian::Little,
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Run `f` with the byte order switched to `endian`, then restore it.
    pub fn with_endian<T>(&mut self, endian: Endian, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = std::mem::replace(&mut self.endian, endian);
        let result = f(self);
        self.endian = saved;
        result
    }

    /// Emit `n` zero bytes of padding.
    pub fn pad(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a four-character code in its byte-reversed disk form.
    pub fn write_tag(&mut self, tag: Tag) {
        self.buf.extend_from_slice(&tag.to_disk());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    write_scalar! {
        write_i16 => i16,
        write_u16 => u16,
        write_i32 => i32,
        write_u32 => u32,
        write_f32 => f32,
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
