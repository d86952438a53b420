use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

use crate::block::TagBlock;
use crate::config::ReadOptions;
use crate::error::Result;
use crate::header::Header;
use crate::schema::TagSchema;
use crate::value::{TagStruct, Value};

/// A parsed tag file: its header and root block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub header: Header,
    pub body: TagBlock,
}

/// Non-fatal irregularities found while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Bytes were left after the root block and its payloads.
    StructuralCorruption { bytes_left: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralCorruption { bytes_left } => {
                write!(f, "{bytes_left} bytes left after the asset was fully parsed")
            }
        }
    }
}

/// Result of a successful read.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub asset: Asset,
    pub warnings: Vec<Warning>,
}

impl Parsed {
    /// Bytes found after the asset, zero for a clean file.
    pub fn bytes_left(&self) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                Warning::StructuralCorruption { bytes_left } => *bytes_left,
            })
            .sum()
    }
}

impl Asset {
    pub fn new(header: Header, root: TagStruct) -> Self {
        Self {
            header,
            body: TagBlock::new(vec![root]),
        }
    }

    /// First element of the root block; the asset proper.
    pub fn root(&self) -> Option<&TagStruct> {
        self.body.elements.first()
    }

    /// Readable JSON projection: structs become objects keyed by field name,
    /// blocks become arrays, enums and flags show their symbols.
    pub fn to_debug_tree(&self) -> Json {
        json!({
            "group": self.header.group.to_string(),
            "version": self.header.version,
            "engine": self.header.engine.to_string(),
            "name": self.header.name(),
            "body": debug_block(&self.body),
        })
    }
}

fn debug_block(block: &TagBlock) -> Json {
    Json::Array(block.iter().map(debug_struct).collect())
}

fn debug_struct(s: &TagStruct) -> Json {
    let mut map = Map::new();
    for field in &s.fields {
        map.insert(field.name.clone(), debug_value(&field.value));
    }
    Json::Object(map)
}

fn debug_value(value: &Value) -> Json {
    match value {
        Value::Enum(e) => match &e.symbol {
            Some(symbol) => json!(symbol),
            None => json!(e.raw),
        },
        Value::Flags(f) => json!({ "raw": f.raw, "set": f.set }),
        Value::String(s) | Value::LongString(s) => json!(s),
        Value::Tag(t) => json!(t.to_string()),
        Value::Struct(s) => debug_struct(s),
        Value::Block(b) => debug_block(b),
        Value::TagRef(r) if r.is_none() => Json::Null,
        Value::TagRef(r) => json!(format!("{}:{}", r.group, r.name)),
        Value::StringId(id) => json!(id.value),
        Value::Data(d) => json!({ "size": d.bytes.len(), "flags": d.flags }),
        // The tagged form carries {type, value}; only the value is interesting.
        other => match serde_json::to_value(other) {
            Ok(Json::Object(mut tagged)) => tagged.remove("value").unwrap_or(Json::Null),
            _ => Json::Null,
        },
    }
}

/// Read and parse a tag file from disk.
pub fn read_asset_file(path: impl AsRef<Path>, schema: &TagSchema, options: &ReadOptions) -> Result<Parsed> {
    let data = std::fs::read(path)?;
    crate::reader::read_asset(&data, schema, options)
}

/// Serialize an asset and write it to disk.
pub fn write_asset_file(path: impl AsRef<Path>, asset: &Asset, schema: &TagSchema) -> Result<()> {
    let bytes = crate::writer::write_asset(asset, schema)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
