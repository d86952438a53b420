//! Cross-references to other assets and interned names.
//!
//! Both are read in two steps: a fixed-size placeholder inline, then the
//! variable-length name once the enclosing fixed region has been consumed.

use serde::{Deserialize, Serialize};

use crate::cursor::{latin1_encode, Cursor, Endian, Writer};
use crate::engine::{Layout, StringIdLayout, TAG_REF_SALT_SIZE};
use crate::error::{Error, Result};
use crate::tag::Tag;

/// A reference to another asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub group: Tag,
    /// Passed through untouched. Always 0 on engines without a salt slot.
    #[serde(default)]
    pub salt: i32,
    /// Name length as read from the placeholder. The writer emits
    /// `name.len()` instead.
    #[serde(default)]
    pub name_length: i32,
    /// Index into the consumer's asset table; -1 when unresolved.
    pub index: i32,
    pub name: String,
}

impl Default for TagRef {
    fn default() -> Self {
        Self {
            group: Tag::NONE,
            salt: 0,
            name_length: 0,
            index: -1,
            name: String::new(),
        }
    }
}

fn length_from(offset: usize, raw: i32) -> Result<usize> {
    usize::try_from(raw).map_err(|_| Error::NegativeCount { offset, count: raw })
}

/// Encode a deferred name for `field`.
fn encode_name(name: &str, field: &str) -> Result<Vec<u8>> {
    latin1_encode(name).ok_or_else(|| Error::ValueMismatch {
        field: field.to_string(),
        expected: "Latin-1 name",
    })
}

fn length_to(bytes: &[u8], field: &str) -> Result<i32> {
    i32::try_from(bytes.len()).map_err(|_| Error::ValueMismatch {
        field: field.to_string(),
        expected: "name shorter than 2 GiB",
    })
}

impl TagRef {
    pub fn new(group: Tag, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            group,
            name_length: name.chars().count() as i32,
            name,
            ..Self::default()
        }
    }

    /// A reference with no target: empty group, empty name.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }

    /// Read the inline placeholder. The name is left empty.
    pub fn read_inline(c: &mut Cursor<'_>, layout: &Layout) -> Result<Self> {
        let group = c.read_tag()?;
        let salt = if layout.tag_ref_salt {
            c.read_i32()?
        } else {
            c.skip(TAG_REF_SALT_SIZE)?;
            0
        };
        let offset = c.position();
        let name_length = c.with_endian(layout.tag_ref_name_length_endian, |c| c.read_i32())?;
        length_from(offset, name_length)?;
        let index = c.read_i32()?;
        Ok(Self {
            group,
            salt,
            name_length,
            index,
            name: String::new(),
        })
    }

    /// Read the deferred name. A zero length reads nothing.
    pub fn resolve(&mut self, c: &mut Cursor<'_>) -> Result<()> {
        let len = length_from(c.position(), self.name_length)?;
        if len > 0 {
            self.name = c.read_latin1(len)?;
        }
        Ok(())
    }

    /// Write the placeholder. Returns the encoded name, owed after the
    /// enclosing fixed region.
    pub fn write_inline(&self, w: &mut Writer, layout: &Layout, field: &str) -> Result<Vec<u8>> {
        let name = encode_name(&self.name, field)?;
        let len = length_to(&name, field)?;
        w.write_tag(self.group);
        if layout.tag_ref_salt {
            w.write_i32(self.salt);
        } else {
            w.pad(TAG_REF_SALT_SIZE);
        }
        w.with_endian(layout.tag_ref_name_length_endian, |w| {
            w.write_i32(len);
            Ok(())
        })?;
        w.write_i32(self.index);
        Ok(name)
    }

    /// Look up the referenced asset in a consumer-supplied table.
    pub fn lookup<'t, T>(&self, table: &'t [T]) -> Result<&'t T> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| table.get(i))
            .ok_or(Error::UnresolvedReferenceIndex {
                index: self.index,
                len: table.len(),
            })
    }
}

/// An interned name stored as a deferred string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringId {
    pub value: String,
}

impl StringId {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Read the inline length placeholder.
    pub fn read_length(c: &mut Cursor<'_>, layout: &Layout) -> Result<usize> {
        match layout.string_id {
            StringIdLayout::ShortBigEndian { pad } => {
                let len = c.with_endian(Endian::Big, |c| c.read_u16())?;
                c.skip(pad)?;
                Ok(usize::from(len))
            }
            StringIdLayout::Long => {
                let offset = c.position();
                length_from(offset, c.read_i32()?)
            }
        }
    }

    /// Write the length placeholder. Returns the encoded name.
    pub fn write_length(&self, w: &mut Writer, layout: &Layout, field: &str) -> Result<Vec<u8>> {
        let name = encode_name(&self.value, field)?;
        match layout.string_id {
            StringIdLayout::ShortBigEndian { pad } => {
                let len = u16::try_from(name.len()).map_err(|_| Error::ValueMismatch {
                    field: field.to_string(),
                    expected: "string id shorter than 64 KiB",
                })?;
                w.with_endian(Endian::Big, |w| {
                    w.write_u16(len);
                    Ok(())
                })?;
                w.pad(pad);
            }
            StringIdLayout::Long => w.write_i32(length_to(&name, field)?),
        }
        Ok(name)
    }
}
