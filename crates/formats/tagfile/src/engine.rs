//! Engine snapshots and the fixed layout each one uses.
//!
//! Known engines, oldest first:
//! - `LAMB`: first snapshot. Empty blocks still carry a block header, tag
//!   reference name lengths are big-endian, raw data has no identifier.
//! - `MLAB`: little-endian throughout, tag references carry a salt.
//! - `BLM!`: adds a maximum-count word to inline block fields.
//!
//! Adding a snapshot means adding one variant and one [`Layout`] constant.

use serde::{Deserialize, Serialize};

use crate::cursor::Endian;
use crate::error::{Error, Result, Unsupported};
use crate::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "LAMB")]
    Lamb,
    #[serde(rename = "MLAB")]
    Mlab,
    #[serde(rename = "BLM!")]
    Blam,
}

/// How a `string_id` placeholder is laid out inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringIdLayout {
    /// Big-endian u16 length followed by `pad` inert bytes.
    ShortBigEndian { pad: usize },
    /// Little-endian i32 length.
    Long,
}

/// Per-engine widths and switches. Every value here is taken as-is from
/// files written by that engine; none of them is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Whether a block with zero elements still emits its `tbfd` header.
    pub empty_block_header: bool,
    /// Whether the word after a tag reference's group is a salt. When false
    /// it is `TAG_REF_SALT_SIZE` bytes of padding.
    pub tag_ref_salt: bool,
    /// Byte order of a tag reference's name length.
    pub tag_ref_name_length_endian: Endian,
    /// Whether inline block fields carry a maximum-count word.
    pub block_max_count: bool,
    /// Whether raw data fields end with an identifier word.
    pub raw_data_identifier: bool,
    pub string_id: StringIdLayout,
}

/// Width of the slot between a tag reference's group and its name length.
pub const TAG_REF_SALT_SIZE: usize = 4;
/// group + salt + name length + index.
pub const TAG_REF_SIZE: usize = 16;
/// Width of the `tbfd` block header.
pub const BLOCK_HEADER_SIZE: usize = 16;
/// Padding after the big-endian `string_id` length on `LAMB`.
pub const LAMB_STRING_ID_PAD: usize = 2;

const LAMB: Layout = Layout {
    empty_block_header: true,
    tag_ref_salt: false,
    tag_ref_name_length_endian: Endian::Big,
    block_max_count: false,
    raw_data_identifier: false,
    string_id: StringIdLayout::ShortBigEndian {
        pad: LAMB_STRING_ID_PAD,
    },
};

const MLAB: Layout = Layout {
    empty_block_header: false,
    tag_ref_salt: true,
    tag_ref_name_length_endian: Endian::Little,
    block_max_count: false,
    raw_data_identifier: true,
    string_id: StringIdLayout::Long,
};

const BLAM: Layout = Layout {
    empty_block_header: false,
    tag_ref_salt: true,
    tag_ref_name_length_endian: Endian::Little,
    block_max_count: true,
    raw_data_identifier: true,
    string_id: StringIdLayout::Long,
};

impl Engine {
    pub const ALL: [Self; 3] = [Self::Lamb, Self::Mlab, Self::Blam];

    pub fn from_tag(tag: Tag) -> Result<Self> {
        match &tag.0 {
            b"LAMB" => Ok(Self::Lamb),
            b"MLAB" => Ok(Self::Mlab),
            b"BLM!" => Ok(Self::Blam),
            _ => Err(Error::UnsupportedVersion(Unsupported::Engine(tag))),
        }
    }

    pub fn tag(self) -> Tag {
        match self {
            Self::Lamb => Tag::new(b"LAMB"),
            Self::Mlab => Tag::new(b"MLAB"),
            Self::Blam => Tag::new(b"BLM!"),
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            Self::Lamb => &LAMB,
            Self::Mlab => &MLAB,
            Self::Blam => &BLAM,
        }
    }
}

impl Layout {
    /// Inline size of a block field: count, [maximum count], address, definition.
    pub fn block_field_size(&self) -> usize {
        if self.block_max_count {
            16
        } else {
            12
        }
    }

    /// Inline size of a raw data field: size, flags, raw pointer, runtime
    /// pointer, [identifier].
    pub fn raw_data_size(&self) -> usize {
        if self.raw_data_identifier {
            20
        } else {
            16
        }
    }

    pub fn string_id_size(&self) -> usize {
        match self.string_id {
            StringIdLayout::ShortBigEndian { pad } => 2 + pad,
            StringIdLayout::Long => 4,
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
