//! Repeated element arrays.
//!
//! A block field's inline part only records the element count. The elements
//! themselves follow the enclosing fixed region: a `tbfd` header, every
//! element's fixed region back to back, then the elements' deferred payloads.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Writer};
use crate::engine::{Layout, BLOCK_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::tag::Tag;
use crate::value::TagStruct;

/// Kind tag of every block header.
pub const BLOCK_KIND: Tag = Tag::new(b"tbfd");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagBlockHeader {
    pub kind: Tag,
    pub version: i32,
    pub count: i32,
    pub stride: i32,
}

impl TagBlockHeader {
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        c.ensure(BLOCK_HEADER_SIZE)?;
        let offset = c.position();
        let kind = c.read_tag()?;
        if kind != BLOCK_KIND {
            return Err(Error::InvalidBlockHeader { offset, found: kind });
        }
        let version = c.read_i32()?;
        let count = c.read_i32()?;
        let stride = c.read_i32()?;
        if count < 0 {
            return Err(Error::NegativeCount { offset: offset + 8, count });
        }
        Ok(Self {
            kind,
            version,
            count,
            stride,
        })
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_tag(self.kind);
        w.write_i32(self.version);
        w.write_i32(self.count);
        w.write_i32(self.stride);
    }

    /// Fail with `TruncatedStream` unless `count × stride` bytes remain.
    pub fn ensure_fits(&self, c: &Cursor<'_>) -> Result<()> {
        let need = (self.count as usize).saturating_mul(self.stride.max(0) as usize);
        c.ensure(need)
    }
}

/// A (possibly empty) block of elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagBlock {
    /// Capacity hint. Only stored on engines with a maximum-count word.
    #[serde(default)]
    pub maximum_count: i32,
    /// Opaque, meaningless after parsing.
    #[serde(default)]
    pub address: u32,
    /// Opaque schema id.
    #[serde(default)]
    pub definition: u32,
    /// Version from the block header. Zero when the header is absent.
    #[serde(default)]
    pub version: i32,
    pub elements: Vec<TagStruct>,
}

impl TagBlock {
    pub fn new(elements: Vec<TagStruct>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagStruct> {
        self.elements.iter()
    }

    /// Read the inline field. Returns the block without elements, and the
    /// element count to read later.
    pub fn read_inline(c: &mut Cursor<'_>, layout: &Layout) -> Result<(Self, usize)> {
        let offset = c.position();
        let count = c.read_i32()?;
        let count = usize::try_from(count).map_err(|_| Error::NegativeCount { offset, count })?;
        let maximum_count = if layout.block_max_count { c.read_i32()? } else { 0 };
        let address = c.read_u32()?;
        let definition = c.read_u32()?;
        Ok((
            Self {
                maximum_count,
                address,
                definition,
                version: 0,
                elements: Vec::new(),
            },
            count,
        ))
    }

    pub fn write_inline(&self, w: &mut Writer, layout: &Layout, field: &str) -> Result<()> {
        w.write_i32(self.count_i32(field)?);
        if layout.block_max_count {
            w.write_i32(self.maximum_count);
        }
        w.write_u32(self.address);
        w.write_u32(self.definition);
        Ok(())
    }

    /// Whether a header precedes this block's elements.
    pub fn has_header(count: usize, layout: &Layout) -> bool {
        count > 0 || layout.empty_block_header
    }

    pub(crate) fn count_i32(&self, field: &str) -> Result<i32> {
        i32::try_from(self.elements.len()).map_err(|_| Error::ValueMismatch {
            field: field.to_string(),
            expected: "block with fewer than 2^31 elements",
        })
    }
}

impl<'a> IntoIterator for &'a TagBlock {
    type Item = &'a TagStruct;
    type IntoIter = std::slice::Iter<'a, TagStruct>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
