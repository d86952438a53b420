//! Schema-driven decoding of a whole asset.
//!
//! Each nesting level is read in two passes: the fixed regions of every
//! element, then the payloads those regions announced, in announcement order.
//! Nested blocks are payloads too, so their own levels are read recursively
//! from the parent's drain.

use tracing::{debug, trace, warn};

use crate::asset::{Asset, Parsed, Warning};
use crate::block::{TagBlock, TagBlockHeader};
use crate::config::{ReadOptions, TrailingBytes};
use crate::cursor::Cursor;
use crate::data::RawData;
use crate::deferred::{DeferredQueue, Slot};
use crate::engine::{Engine, Layout};
use crate::error::{Error, Result, Unsupported};
use crate::header::Header;
use crate::primitive;
use crate::schema::{FieldKind, StructDef, TagSchema};
use crate::tag_ref::{StringId, TagRef};
use crate::value::{TagStruct, Value};

/// A payload announced by a placeholder in the fixed region.
#[derive(Debug)]
enum Pending<'s> {
    Name,
    StringId { length: usize },
    Data { size: usize },
    Block { count: usize, def: &'s StructDef },
}

#[derive(Debug)]
struct Queued<'s> {
    field: &'s str,
    pending: Pending<'s>,
}

/// Body reader for one engine layout.
pub struct TagReader<'a> {
    cursor: Cursor<'a>,
    engine: Engine,
    layout: &'static Layout,
}

impl<'a> TagReader<'a> {
    pub fn new(cursor: Cursor<'a>, engine: Engine) -> Self {
        Self {
            cursor,
            engine,
            layout: engine.layout(),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Read a block's header and elements.
    ///
    /// `expected` is the count from the block's inline field. The root block
    /// has no inline field: pass `None` and its header is mandatory.
    pub fn read_block(&mut self, def: &StructDef, block: &mut TagBlock, expected: Option<usize>) -> Result<()> {
        let has_header = expected.is_none_or(|count| TagBlock::has_header(count, self.layout));
        let mut count = expected.unwrap_or(0);
        if has_header {
            let header = TagBlockHeader::read(&mut self.cursor)?;
            if let Some(inline) = expected {
                if header.count as usize != inline {
                    return Err(Error::BlockCountMismatch {
                        block: def.name.clone(),
                        header: header.count,
                        field: inline as i32,
                    });
                }
            }
            let stride = def.fixed_size(self.engine);
            if usize::try_from(header.stride).ok() != Some(stride) {
                return Err(Error::StrideMismatch {
                    block: def.name.clone(),
                    expected: stride,
                    found: header.stride,
                });
            }
            if stride == 0 && header.count > 0 {
                return Err(Error::ZeroStride {
                    block: def.name.clone(),
                    count: header.count,
                });
            }
            header.ensure_fits(&self.cursor)?;
            count = header.count as usize;
            block.version = header.version;
        }
        debug!(
            block = %def.name,
            count,
            offset = self.cursor.position(),
            "reading block"
        );
        block.elements = self.read_level(def, count)?;
        Ok(())
    }

    /// Read `count` elements of one nesting level, then drain its payloads.
    fn read_level(&mut self, def: &StructDef, count: usize) -> Result<Vec<TagStruct>> {
        let mut queue = DeferredQueue::new();
        let mut elements = Vec::with_capacity(count.min(self.cursor.remaining()));
        for element in 0..count {
            elements.push(self.read_fixed(def, element, &[], &mut queue)?);
        }
        self.drain(&mut elements, queue)?;
        Ok(elements)
    }

    /// Read one struct's fixed region. Placeholders are queued, with the
    /// field path from the element root in `prefix`.
    fn read_fixed<'s>(
        &mut self,
        def: &'s StructDef,
        element: usize,
        prefix: &[usize],
        queue: &mut DeferredQueue<Queued<'s>>,
    ) -> Result<TagStruct> {
        let mut out = TagStruct::new();
        for field in def.fields_for(self.engine) {
            let offset = self.cursor.position();
            let slot = || {
                let mut path = prefix.to_vec();
                path.push(out.fields.len());
                Slot { element, path }
            };
            let queued = |pending: Pending<'s>| Queued {
                field: field.name.as_str(),
                pending,
            };
            let value = match &field.kind {
                FieldKind::Pad { .. } => {
                    self.cursor.skip(field.kind.inline_size(self.engine))?;
                    continue;
                }
                FieldKind::Struct { def: inner } => {
                    let path = slot().path;
                    Value::Struct(self.read_fixed(inner, element, &path, queue)?)
                }
                FieldKind::Block { def: inner } => {
                    let (block, count) = TagBlock::read_inline(&mut self.cursor, self.layout)?;
                    queue.push(offset, slot(), queued(Pending::Block { count, def: inner }));
                    Value::Block(block)
                }
                FieldKind::TagRef { .. } => {
                    let r = TagRef::read_inline(&mut self.cursor, self.layout)?;
                    if r.name_length > 0 {
                        queue.push(offset, slot(), queued(Pending::Name));
                    }
                    Value::TagRef(r)
                }
                FieldKind::StringId => {
                    let length = StringId::read_length(&mut self.cursor, self.layout)?;
                    if length > 0 {
                        queue.push(offset, slot(), queued(Pending::StringId { length }));
                    }
                    Value::StringId(StringId::default())
                }
                FieldKind::Data => {
                    let (data, size) = RawData::read_inline(&mut self.cursor, self.layout)?;
                    if size > 0 {
                        queue.push(offset, slot(), queued(Pending::Data { size }));
                    }
                    Value::Data(data)
                }
                kind => match primitive::read(&mut self.cursor, kind)? {
                    Some(value) => value,
                    None => continue,
                },
            };
            out.push(field.name.clone(), value);
        }
        Ok(out)
    }

    fn drain(&mut self, elements: &mut [TagStruct], queue: DeferredQueue<Queued<'_>>) -> Result<()> {
        for entry in queue {
            let Queued { field, pending } = entry.payload;
            trace!(
                field,
                order = entry.order,
                placeholder = entry.placeholder,
                offset = self.cursor.position(),
                "resolving deferred payload"
            );
            let value = elements
                .get_mut(entry.slot.element)
                .and_then(|e| e.slot_mut(&entry.slot.path))
                .ok_or_else(|| Error::ValueMismatch {
                    field: field.to_string(),
                    expected: "a slot for its deferred payload",
                })?;
            match (pending, value) {
                (Pending::Name, Value::TagRef(r)) => r.resolve(&mut self.cursor)?,
                (Pending::StringId { length }, Value::StringId(id)) => {
                    id.value = self.cursor.read_latin1(length)?;
                }
                (Pending::Data { size }, Value::Data(data)) => data.read_payload(&mut self.cursor, size)?,
                (Pending::Block { count, def }, Value::Block(block)) => self.read_block(def, block, Some(count))?,
                (pending, _) => {
                    return Err(Error::ValueMismatch {
                        field: field.to_string(),
                        expected: match pending {
                            Pending::Name => "tag_ref",
                            Pending::StringId { .. } => "string_id",
                            Pending::Data { .. } => "data",
                            Pending::Block { .. } => "block",
                        },
                    })
                }
            }
        }
        Ok(())
    }
}

/// Parse a complete asset: header, root block, then the trailing-bytes
/// check.
pub fn read_asset(data: &[u8], schema: &TagSchema, options: &ReadOptions) -> Result<Parsed> {
    let mut cursor = Cursor::new(data);
    let header = Header::parse(&mut cursor)?;
    if header.group != schema.group {
        return Err(Error::GroupMismatch {
            expected: schema.group,
            found: header.group,
        });
    }
    if !schema.supports_version(header.version) {
        return Err(Error::UnsupportedVersion(Unsupported::Version {
            group: header.group,
            found: header.version,
            min: schema.min_version,
            max: schema.max_version,
        }));
    }
    debug!(
        group = %header.group,
        version = header.version,
        engine = %header.engine,
        size = data.len(),
        "parsing asset"
    );

    let mut reader = TagReader::new(cursor, header.engine);
    let mut body = TagBlock::default();
    reader.read_block(&schema.root, &mut body, None)?;

    let mut warnings = Vec::new();
    let bytes_left = reader.remaining();
    if bytes_left > 0 {
        match options.trailing_bytes {
            TrailingBytes::Reject => return Err(Error::StructuralCorruption { bytes_left }),
            TrailingBytes::Warn => {
                warn!(
                    group = %header.group,
                    offset = reader.position(),
                    bytes_left,
                    "bytes left after asset"
                );
                warnings.push(Warning::StructuralCorruption { bytes_left });
            }
        }
    }
    Ok(Parsed {
        asset: Asset { header, body },
        warnings,
    })
}
