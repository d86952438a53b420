//! Schema-driven encoding of a whole asset. Mirrors [`crate::reader`].

use tracing::{debug, trace};

use crate::asset::Asset;
use crate::block::{TagBlock, TagBlockHeader, BLOCK_KIND};
use crate::cursor::Writer;
use crate::data::RawData;
use crate::deferred::{DeferredQueue, Slot};
use crate::engine::{Engine, Layout};
use crate::error::{Error, Result};
use crate::header::HEADER_SIZE;
use crate::primitive;
use crate::schema::{FieldKind, StructDef, TagSchema};
use crate::value::{TagStruct, Value};

/// A payload owed by a placeholder already written.
enum Owed<'v, 's> {
    Name(Vec<u8>),
    Data(&'v RawData),
    Block(&'v TagBlock, &'s StructDef),
}

/// Body writer for one engine layout.
pub struct TagWriter {
    out: Writer,
    engine: Engine,
    layout: &'static Layout,
}

fn mismatch(field: &str, expected: &'static str) -> Error {
    Error::ValueMismatch {
        field: field.to_string(),
        expected,
    }
}

impl TagWriter {
    pub fn new(out: Writer, engine: Engine) -> Self {
        Self {
            out,
            engine,
            layout: engine.layout(),
        }
    }

    pub fn into_inner(self) -> Writer {
        self.out
    }

    /// Write a block's header (when the layout calls for one) and elements.
    /// The root block always gets a header.
    pub fn write_block(&mut self, def: &StructDef, block: &TagBlock, root: bool) -> Result<()> {
        if root || TagBlock::has_header(block.len(), self.layout) {
            let count = block.count_i32(&def.name)?;
            let stride = def.fixed_size(self.engine);
            if stride == 0 && count > 0 {
                return Err(Error::ZeroStride {
                    block: def.name.clone(),
                    count,
                });
            }
            TagBlockHeader {
                kind: BLOCK_KIND,
                version: block.version,
                count,
                stride: stride as i32,
            }
            .write(&mut self.out);
        }
        debug!(
            block = %def.name,
            count = block.len(),
            offset = self.out.position(),
            "writing block"
        );
        self.write_level(def, &block.elements)
    }

    fn write_level(&mut self, def: &StructDef, elements: &[TagStruct]) -> Result<()> {
        let mut queue = DeferredQueue::new();
        for (element, s) in elements.iter().enumerate() {
            self.write_fixed(def, s, element, &[], &mut queue)?;
        }
        for entry in queue {
            trace!(
                order = entry.order,
                placeholder = entry.placeholder,
                offset = self.out.position(),
                "writing deferred payload"
            );
            match entry.payload {
                Owed::Name(name) => self.out.write_bytes(&name),
                Owed::Data(data) => data.write_payload(&mut self.out),
                Owed::Block(block, def) => self.write_block(def, block, false)?,
            }
        }
        Ok(())
    }

    /// Write one struct's fixed region. Values are matched to schema fields
    /// by position and checked by name.
    fn write_fixed<'v, 's>(
        &mut self,
        def: &'s StructDef,
        s: &'v TagStruct,
        element: usize,
        prefix: &[usize],
        queue: &mut DeferredQueue<Owed<'v, 's>>,
    ) -> Result<()> {
        let mut values = s.fields.iter().enumerate();
        for field in def.fields_for(self.engine) {
            if let FieldKind::Pad { .. } = field.kind {
                self.out.pad(field.kind.inline_size(self.engine));
                continue;
            }
            let Some((index, value)) = values.next() else {
                return Err(mismatch(&field.name, "a value for every schema field"));
            };
            if value.name != field.name {
                return Err(mismatch(&value.name, "fields in schema order"));
            }
            let offset = self.out.position();
            let slot = || {
                let mut path = prefix.to_vec();
                path.push(index);
                Slot { element, path }
            };
            match (&field.kind, &value.value) {
                (FieldKind::Struct { def: inner }, Value::Struct(v)) => {
                    self.write_fixed(inner, v, element, &slot().path, queue)?;
                }
                (FieldKind::Block { def: inner }, Value::Block(b)) => {
                    b.write_inline(&mut self.out, self.layout, &field.name)?;
                    queue.push(offset, slot(), Owed::Block(b, inner));
                }
                (FieldKind::TagRef { .. }, Value::TagRef(r)) => {
                    let name = r.write_inline(&mut self.out, self.layout, &field.name)?;
                    if !name.is_empty() {
                        queue.push(offset, slot(), Owed::Name(name));
                    }
                }
                (FieldKind::StringId, Value::StringId(id)) => {
                    let name = id.write_length(&mut self.out, self.layout, &field.name)?;
                    if !name.is_empty() {
                        queue.push(offset, slot(), Owed::Name(name));
                    }
                }
                (FieldKind::Data, Value::Data(d)) => {
                    d.write_inline(&mut self.out, self.layout, &field.name)?;
                    if !d.bytes.is_empty() {
                        queue.push(offset, slot(), Owed::Data(d));
                    }
                }
                (kind, v) => primitive::write(&mut self.out, kind, v, &field.name)?,
            }
        }
        if let Some((_, extra)) = values.next() {
            return Err(mismatch(&extra.name, "no fields beyond the schema"));
        }
        Ok(())
    }
}

/// Serialize an asset: header, root block, then every deferred payload.
pub fn write_asset(asset: &Asset, schema: &TagSchema) -> Result<Vec<u8>> {
    let header = &asset.header;
    if header.group != schema.group {
        return Err(Error::GroupMismatch {
            expected: schema.group,
            found: header.group,
        });
    }
    debug!(group = %header.group, engine = %header.engine, "writing asset");
    let mut out = Writer::with_capacity(HEADER_SIZE + schema.root.fixed_size(header.engine));
    header.write(&mut out);
    let mut writer = TagWriter::new(out, header.engine);
    writer.write_block(&schema.root, &asset.body, true)?;
    Ok(writer.into_inner().into_bytes())
}
