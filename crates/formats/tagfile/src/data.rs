use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Writer};
use crate::engine::Layout;
use crate::error::{Error, Result};

/// An opaque byte span: script bytecode, editor metadata and the like.
///
/// The payload follows the enclosing fixed region, like a tag reference name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawData {
    pub flags: i32,
    /// File-local pointer, meaningless once loaded.
    pub raw_pointer: i32,
    /// Only present on engines with an identifier word.
    #[serde(default)]
    pub identifier: i32,
    pub bytes: Vec<u8>,
}

impl RawData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    /// Read the inline descriptor. Returns the descriptor with an empty
    /// payload, and the payload size to read later.
    ///
    /// The runtime pointer is discarded; it is zero in every file.
    pub fn read_inline(c: &mut Cursor<'_>, layout: &Layout) -> Result<(Self, usize)> {
        let offset = c.position();
        let size = c.read_i32()?;
        let size = usize::try_from(size).map_err(|_| Error::NegativeCount { offset, count: size })?;
        let flags = c.read_i32()?;
        let raw_pointer = c.read_i32()?;
        let _runtime_pointer = c.read_i32()?;
        let identifier = if layout.raw_data_identifier { c.read_i32()? } else { 0 };
        Ok((
            Self {
                flags,
                raw_pointer,
                identifier,
                bytes: Vec::new(),
            },
            size,
        ))
    }

    pub fn read_payload(&mut self, c: &mut Cursor<'_>, size: usize) -> Result<()> {
        self.bytes = c.read_bytes(size)?.to_vec();
        Ok(())
    }

    pub fn write_inline(&self, w: &mut Writer, layout: &Layout, field: &str) -> Result<()> {
        let size = i32::try_from(self.bytes.len()).map_err(|_| Error::ValueMismatch {
            field: field.to_string(),
            expected: "data shorter than 2 GiB",
        })?;
        w.write_i32(size);
        w.write_i32(self.flags);
        w.write_i32(self.raw_pointer);
        w.write_i32(0);
        if layout.raw_data_identifier {
            w.write_i32(self.identifier);
        }
        Ok(())
    }

    pub fn write_payload(&self, w: &mut Writer) {
        w.write_bytes(&self.bytes);
    }
}
