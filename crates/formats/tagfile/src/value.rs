use serde::{Deserialize, Serialize};

use crate::block::TagBlock;
use crate::data::RawData;
use crate::primitive::{
    ArgbColor, Bounds, EnumValue, Euler2d, Euler3d, FlagsValue, Plane2d, Plane3d, Point2d, Quaternion,
    Rectangle2d, RgbColor, Vector2d, Vector3d, Vector4d,
};
use crate::tag::Tag;
use crate::tag_ref::{StringId, TagRef};

/// A decoded field value.
///
/// Floats compare by value, so a NaN read from disk is not equal to itself
/// even though it writes back bit for bit. JSON has no NaN or infinity:
/// serde_json writes them as `null`, which does not deserialize, so a value
/// tree holding one cannot be packed from its JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Char(i8),
    Short(i16),
    Long(i32),
    Byte(u8),
    Word(u16),
    Dword(u32),
    Real(f32),
    RealFraction(f32),
    /// Degrees.
    Angle(f64),
    Enum(EnumValue),
    Flags(FlagsValue),
    Point2d(Point2d),
    Rectangle2d(Rectangle2d),
    Vector2d(Vector2d),
    Vector3d(Vector3d),
    Vector4d(Vector4d),
    Quaternion(Quaternion),
    Euler2d(Euler2d),
    Euler3d(Euler3d),
    Plane2d(Plane2d),
    Plane3d(Plane3d),
    RgbColor(RgbColor),
    ArgbColor(ArgbColor),
    ShortBounds(Bounds<i16>),
    RealBounds(Bounds<f32>),
    RealFractionBounds(Bounds<f32>),
    /// Degrees.
    AngleBounds(Bounds<f64>),
    String(String),
    LongString(String),
    Tag(Tag),
    Struct(TagStruct),
    Block(TagBlock),
    TagRef(TagRef),
    StringId(StringId),
    Data(RawData),
}

/// One named field of a struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub value: Value,
}

/// One element of a block, or an inline struct. Padding is not stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagStruct {
    pub fields: Vec<Field>,
}

impl TagStruct {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|f| f.name == name).map(|f| &mut f.value)
    }

    pub fn tag_ref(&self, name: &str) -> Option<&TagRef> {
        match self.get(name)? {
            Value::TagRef(r) => Some(r),
            _ => None,
        }
    }

    pub fn block(&self, name: &str) -> Option<&TagBlock> {
        match self.get(name)? {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Follow field indices through nested inline structs.
    pub(crate) fn slot_mut(&mut self, path: &[usize]) -> Option<&mut Value> {
        let (&first, rest) = path.split_first()?;
        let value = &mut self.fields.get_mut(first)?.value;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            Value::Struct(inner) => inner.slot_mut(rest),
            _ => None,
        }
    }
}
