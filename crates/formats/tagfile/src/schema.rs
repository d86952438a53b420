//! Declarative field lists for asset types.
//!
//! A schema is an ordered list of fields per struct. Fields may be limited
//! to some engines and padding may change width per engine, which together
//! cover every way the engine layouts differ. Schemas serialize to JSON so
//! tools can load them from disk.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::engine::{Engine, TAG_REF_SIZE};
use crate::primitive;
use crate::tag::Tag;

/// Schema for one tag group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSchema {
    pub group: Tag,
    /// Lowest and highest group versions this schema reads.
    pub min_version: i16,
    pub max_version: i16,
    pub root: StructDef,
}

impl TagSchema {
    pub fn new(group: Tag, versions: RangeInclusive<i16>, root: StructDef) -> Self {
        Self {
            group,
            min_version: *versions.start(),
            max_version: *versions.end(),
            root,
        }
    }

    pub fn supports_version(&self, version: i16) -> bool {
        (self.min_version..=self.max_version).contains(&version)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Engines this field exists in. `None` means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<Vec<Engine>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Char,
    Short,
    Long,
    Byte,
    Word,
    Dword,
    Real,
    RealFraction,
    Angle,
    CharEnum {
        #[serde(default)]
        options: Vec<String>,
    },
    ShortEnum {
        #[serde(default)]
        options: Vec<String>,
    },
    LongEnum {
        #[serde(default)]
        options: Vec<String>,
    },
    ByteFlags {
        #[serde(default)]
        bits: Vec<String>,
    },
    WordFlags {
        #[serde(default)]
        bits: Vec<String>,
    },
    LongFlags {
        #[serde(default)]
        bits: Vec<String>,
    },
    Point2d,
    Rectangle2d,
    Vector2d,
    Vector3d,
    Vector4d,
    Quaternion,
    Euler2d,
    Euler3d,
    Plane2d,
    Plane3d,
    RgbColor,
    ArgbColor,
    ShortBounds,
    RealBounds,
    RealFractionBounds,
    AngleBounds,
    String,
    LongString,
    Tag,
    /// Inert bytes. `overrides` replaces `size` for specific engines.
    Pad {
        size: usize,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        overrides: BTreeMap<Engine, usize>,
    },
    Struct {
        def: StructDef,
    },
    Block {
        def: StructDef,
    },
    TagRef {
        /// Groups the reference may point at. Informational only.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        groups: Vec<Tag>,
    },
    StringId,
    Data,
}

impl FieldKind {
    /// Name used in schema files and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Short => "short",
            Self::Long => "long",
            Self::Byte => "byte",
            Self::Word => "word",
            Self::Dword => "dword",
            Self::Real => "real",
            Self::RealFraction => "real_fraction",
            Self::Angle => "angle",
            Self::CharEnum { .. } => "char_enum",
            Self::ShortEnum { .. } => "short_enum",
            Self::LongEnum { .. } => "long_enum",
            Self::ByteFlags { .. } => "byte_flags",
            Self::WordFlags { .. } => "word_flags",
            Self::LongFlags { .. } => "long_flags",
            Self::Point2d => "point2d",
            Self::Rectangle2d => "rectangle2d",
            Self::Vector2d => "vector2d",
            Self::Vector3d => "vector3d",
            Self::Vector4d => "vector4d",
            Self::Quaternion => "quaternion",
            Self::Euler2d => "euler2d",
            Self::Euler3d => "euler3d",
            Self::Plane2d => "plane2d",
            Self::Plane3d => "plane3d",
            Self::RgbColor => "rgb_color",
            Self::ArgbColor => "argb_color",
            Self::ShortBounds => "short_bounds",
            Self::RealBounds => "real_bounds",
            Self::RealFractionBounds => "real_fraction_bounds",
            Self::AngleBounds => "angle_bounds",
            Self::String => "string",
            Self::LongString => "long_string",
            Self::Tag => "tag",
            Self::Pad { .. } => "pad",
            Self::Struct { .. } => "struct",
            Self::Block { .. } => "block",
            Self::TagRef { .. } => "tag_ref",
            Self::StringId => "string_id",
            Self::Data => "data",
        }
    }

    /// Bytes this field occupies in its struct's fixed region.
    pub fn inline_size(&self, engine: Engine) -> usize {
        let layout = engine.layout();
        match self {
            Self::Pad { size, overrides } => overrides.get(&engine).copied().unwrap_or(*size),
            Self::Struct { def } => def.fixed_size(engine),
            Self::Block { .. } => layout.block_field_size(),
            Self::TagRef { .. } => TAG_REF_SIZE,
            Self::StringId => layout.string_id_size(),
            Self::Data => layout.raw_data_size(),
            other => primitive::size_of(other).unwrap_or(0),
        }
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            engines: None,
        }
    }

    /// Restrict the field to the given engines.
    pub fn only(mut self, engines: &[Engine]) -> Self {
        self.engines = Some(engines.to_vec());
        self
    }

    pub fn present_in(&self, engine: Engine) -> bool {
        self.engines.as_ref().is_none_or(|list| list.contains(&engine))
    }
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(name, kind));
        self
    }

    pub fn push(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn pad(self, size: usize) -> Self {
        let name = format!("pad{}", self.fields.len());
        self.field(
            name,
            FieldKind::Pad {
                size,
                overrides: BTreeMap::new(),
            },
        )
    }

    pub fn block(self, name: impl Into<String>, def: StructDef) -> Self {
        self.field(name, FieldKind::Block { def })
    }

    pub fn tag_ref(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::TagRef { groups: Vec::new() })
    }

    /// Fields in on-disk order for `engine`.
    pub fn fields_for(&self, engine: Engine) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(move |f| f.present_in(engine))
    }

    /// Size of one element's fixed region; the stride a block of this
    /// struct declares in its header.
    pub fn fixed_size(&self, engine: Engine) -> usize {
        self.fields_for(engine).map(|f| f.kind.inline_size(engine)).sum()
    }
}
