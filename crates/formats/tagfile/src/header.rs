use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Writer};
use crate::engine::Engine;
use crate::error::Result;
use crate::tag::Tag;

/// Size of the container header at offset 0.
pub const HEADER_SIZE: usize = 64;

/// The fixed header every tag file starts with. Always little-endian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub unknown: i16,
    pub flags: i8,
    pub kind: i8,
    /// Content name, NUL-padded. Kept as raw bytes so stale bytes after the
    /// terminator survive a rewrite.
    #[serde(with = "name_bytes")]
    pub name: [u8; 32],
    pub group: Tag,
    pub checksum: u32,
    pub data_offset: i32,
    pub data_length: i32,
    pub unknown2: i32,
    /// Format version of the group's root struct.
    pub version: i16,
    pub destination: i8,
    pub plugin_handle: i8,
    pub engine: Engine,
}

impl Header {
    pub fn new(group: Tag, version: i16, engine: Engine) -> Self {
        Self {
            unknown: 0,
            flags: 0,
            kind: 0,
            name: [0; 32],
            group,
            checksum: 0,
            data_offset: HEADER_SIZE as i32,
            data_length: 0,
            unknown2: 0,
            version,
            destination: 0,
            plugin_handle: -1,
            engine,
        }
    }

    /// Content name up to the first NUL.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Parse the header at the cursor's position.
    ///
    /// Fails with `UnsupportedVersion` when the engine tag is unknown.
    pub fn parse(c: &mut Cursor<'_>) -> Result<Self> {
        c.ensure(HEADER_SIZE)?;
        let unknown = c.read_i16()?;
        let flags = c.read_i8()?;
        let kind = c.read_i8()?;
        let name = c.read_array()?;
        let group = c.read_tag()?;
        let checksum = c.read_u32()?;
        let data_offset = c.read_i32()?;
        let data_length = c.read_i32()?;
        let unknown2 = c.read_i32()?;
        let version = c.read_i16()?;
        let destination = c.read_i8()?;
        let plugin_handle = c.read_i8()?;
        let engine = Engine::from_tag(c.read_tag()?)?;

        Ok(Self {
            unknown,
            flags,
            kind,
            name,
            group,
            checksum,
            data_offset,
            data_length,
            unknown2,
            version,
            destination,
            plugin_handle,
            engine,
        })
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_i16(self.unknown);
        w.write_i8(self.flags);
        w.write_i8(self.kind);
        w.write_bytes(&self.name);
        w.write_tag(self.group);
        w.write_u32(self.checksum);
        w.write_i32(self.data_offset);
        w.write_i32(self.data_length);
        w.write_i32(self.unknown2);
        w.write_i16(self.version);
        w.write_i8(self.destination);
        w.write_i8(self.plugin_handle);
        w.write_tag(self.engine.tag());
    }
}

mod name_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(name: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(name)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let bytes = Vec::<u8>::deserialize(d)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("header name must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Unsupported};

    fn sample() -> Header {
        let mut header = Header::new(Tag::new(b"snd!"), 3, Engine::Blam);
        header.name[..5].copy_from_slice(b"hello");
        header.checksum = 0xDEAD_BEEF;
        header
    }

    #[test]
    fn layout_is_64_bytes() {
        let mut w = Writer::new();
        sample().write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[4..9], b"hello");
        assert_eq!(&bytes[36..40], b"!dns");
        assert_eq!(&bytes[56..58], &3i16.to_le_bytes());
        assert_eq!(&bytes[60..64], b"!MLB");
    }

    #[test]
    fn parse_reads_back_written_header() {
        let mut w = Writer::new();
        sample().write(&mut w);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        let header = Header::parse(&mut c).unwrap();
        assert_eq!(header, sample());
        assert_eq!(header.name(), "hello");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn unknown_engine_halts() {
        let mut w = Writer::new();
        sample().write(&mut w);
        let mut bytes = w.into_bytes();
        bytes[60..64].copy_from_slice(b"XXXX");
        let err = Header::parse(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(Unsupported::Engine(_))));
    }

    #[test]
    fn short_header_is_truncated() {
        let bytes = [0u8; 40];
        let err = Header::parse(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { need: 64, have: 40, .. }));
    }
}
