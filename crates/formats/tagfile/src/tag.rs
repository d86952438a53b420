use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A four-character code: group identifiers, engine tags and block kinds.
///
/// Held in reading order (`b"bitm"`). On disk the bytes are reversed, so a
/// `bitm` group is stored as `mtib`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// The all-zero tag used by empty tag references.
    pub const NONE: Self = Self([0; 4]);

    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// Build a tag from the byte-reversed on-disk form.
    pub fn from_disk(bytes: [u8; 4]) -> Self {
        let [a, b, c, d] = bytes;
        Self([d, c, b, a])
    }

    /// The byte-reversed on-disk form.
    pub fn to_disk(self) -> [u8; 4] {
        let [a, b, c, d] = self.0;
        [d, c, b, a]
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{:#010x}", u32::from_be_bytes(self.0))
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_none() {
            serializer.serialize_str("")
        } else {
            serializer.collect_str(self)
        }
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Self::NONE);
        }
        // Codes that are not printable are written in `Display`'s hex form.
        if let Some(hex) = s.strip_prefix("0x").filter(|h| h.len() == 8) {
            let code = u32::from_str_radix(hex, 16)
                .map_err(|_| serde::de::Error::custom(format!("tag {s:?} is not valid hex")))?;
            return Ok(Self(code.to_be_bytes()));
        }
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("tag {s:?} is not four bytes")))?;
        Ok(Self(bytes))
    }
}
