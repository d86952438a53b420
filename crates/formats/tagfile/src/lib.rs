//! Reader/writer for versioned, nested binary tag files.
//!
//! Three-layer architecture:
//! - **Layer 1** (`cursor`, `header`, `engine`): raw byte I/O, the 64-byte
//!   header and the per-engine layout table
//! - **Layer 2** (`primitive`, `block`, `tag_ref`, `data`, `deferred`): field
//!   codecs and the fixed-region-then-payloads protocol
//! - **Layer 3** (`reader`, `writer`, `asset`): schema-driven decoding and
//!   encoding of whole assets into the dynamic [`Value`] tree

pub mod asset;
pub mod block;
pub mod config;
pub mod cursor;
pub mod data;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod header;
pub mod primitive;
pub mod reader;
pub mod schema;
pub mod tag;
pub mod tag_ref;
pub mod value;
pub mod writer;

pub use asset::{read_asset_file, write_asset_file, Asset, Parsed, Warning};
pub use block::TagBlock;
pub use config::{ReadOptions, TrailingBytes};
pub use engine::Engine;
pub use error::{Error, Result, Unsupported};
pub use header::Header;
pub use reader::read_asset;
pub use schema::{FieldDef, FieldKind, StructDef, TagSchema};
pub use tag::Tag;
pub use tag_ref::{StringId, TagRef};
pub use value::{Field, TagStruct, Value};
pub use writer::write_asset;
