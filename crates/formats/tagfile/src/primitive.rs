//! Fixed-width field encodings.
//!
//! Every function here advances the cursor by exactly the field's width. The
//! only failure is running out of bytes; enum and flag values outside the
//! declared symbols are kept as raw integers.

use serde::{Deserialize, Serialize};

use crate::cursor::{latin1_decode, latin1_encode, Cursor, Writer};
use crate::error::{Error, Result};
use crate::schema::FieldKind;
use crate::value::Value;

pub const STRING_SIZE: usize = 32;
pub const LONG_STRING_SIZE: usize = 256;

/// Angles are radians on disk and degrees in memory. Widening to `f64`
/// before converting keeps the round trip bit-exact.
pub fn angle_from_disk(radians: f32) -> f64 {
    f64::from(radians).to_degrees()
}

pub fn angle_to_disk(degrees: f64) -> f32 {
    degrees.to_radians() as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point2d {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rectangle2d {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2d {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3d {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector4d {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub i: f32,
    pub j: f32,
    pub k: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            i: 0.0,
            j: 0.0,
            k: 0.0,
            w: 1.0,
        }
    }
}

/// Yaw and pitch, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler2d {
    pub yaw: f64,
    pub pitch: f64,
}

/// Yaw, pitch and roll, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler3d {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane2d {
    pub normal: Vector2d,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane3d {
    pub normal: Vector3d,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArgbColor {
    pub a: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Two adjacent scalars of the same width, no separator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

/// An enum field. `raw` is authoritative; `symbol` is the declared name for
/// it, when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub raw: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// A flags field. Bits without a declared name stay in `raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsValue {
    pub raw: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<String>,
}

impl EnumValue {
    pub fn new(raw: i32, options: &[String]) -> Self {
        let symbol = usize::try_from(raw).ok().and_then(|i| options.get(i)).cloned();
        Self { raw, symbol }
    }
}

impl FlagsValue {
    pub fn new(raw: u32, bits: &[String]) -> Self {
        let set = bits
            .iter()
            .take(32)
            .enumerate()
            .filter(|(bit, _)| raw & (1 << bit) != 0)
            .map(|(_, name)| name.clone())
            .collect();
        Self { raw, set }
    }

    pub fn has_unknown_bits(&self, bits: &[String]) -> bool {
        let known = if bits.len() >= 32 {
            u32::MAX
        } else {
            (1u32 << bits.len()) - 1
        };
        self.raw & !known != 0
    }
}

/// Inline width of a primitive kind, or `None` for composite kinds.
pub fn size_of(kind: &FieldKind) -> Option<usize> {
    use FieldKind::*;
    Some(match kind {
        Char | Byte | CharEnum { .. } | ByteFlags { .. } => 1,
        Short | Word | ShortEnum { .. } | WordFlags { .. } => 2,
        Long | Dword | Real | RealFraction | Angle | LongEnum { .. } | LongFlags { .. } | Tag => 4,
        Point2d | ShortBounds => 4,
        Rectangle2d => 8,
        Vector2d | Euler2d | RealBounds | RealFractionBounds | AngleBounds => 8,
        Vector3d | Euler3d | Plane2d | RgbColor => 12,
        Vector4d | Quaternion | Plane3d | ArgbColor => 16,
        String => STRING_SIZE,
        LongString => LONG_STRING_SIZE,
        Pad { .. } | Struct { .. } | Block { .. } | TagRef { .. } | StringId | Data => return None,
    })
}

fn read_vector2d(c: &mut Cursor<'_>) -> Result<Vector2d> {
    Ok(Vector2d {
        x: c.read_f32()?,
        y: c.read_f32()?,
    })
}

fn read_vector3d(c: &mut Cursor<'_>) -> Result<Vector3d> {
    Ok(Vector3d {
        x: c.read_f32()?,
        y: c.read_f32()?,
        z: c.read_f32()?,
    })
}

fn read_angle(c: &mut Cursor<'_>) -> Result<f64> {
    Ok(angle_from_disk(c.read_f32()?))
}

/// Latin-1 decode up to the first NUL. Total and lossless for every byte.
fn read_fixed_string(c: &mut Cursor<'_>, width: usize) -> Result<std::string::String> {
    let bytes = c.read_bytes(width)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(latin1_decode(&bytes[..end]))
}

/// Read a primitive field. Returns `None` for composite kinds, which the
/// reader handles itself.
pub fn read(c: &mut Cursor<'_>, kind: &FieldKind) -> Result<Option<Value>> {
    use FieldKind as K;
    let value = match kind {
        K::Char => Value::Char(c.read_i8()?),
        K::Short => Value::Short(c.read_i16()?),
        K::Long => Value::Long(c.read_i32()?),
        K::Byte => Value::Byte(c.read_u8()?),
        K::Word => Value::Word(c.read_u16()?),
        K::Dword => Value::Dword(c.read_u32()?),
        K::Real => Value::Real(c.read_f32()?),
        K::RealFraction => Value::RealFraction(c.read_f32()?),
        K::Angle => Value::Angle(read_angle(c)?),
        K::CharEnum { options } => Value::Enum(EnumValue::new(i32::from(c.read_i8()?), options)),
        K::ShortEnum { options } => Value::Enum(EnumValue::new(i32::from(c.read_i16()?), options)),
        K::LongEnum { options } => Value::Enum(EnumValue::new(c.read_i32()?, options)),
        K::ByteFlags { bits } => Value::Flags(FlagsValue::new(u32::from(c.read_u8()?), bits)),
        K::WordFlags { bits } => Value::Flags(FlagsValue::new(u32::from(c.read_u16()?), bits)),
        K::LongFlags { bits } => Value::Flags(FlagsValue::new(c.read_u32()?, bits)),
        K::Point2d => Value::Point2d(Point2d {
            x: c.read_i16()?,
            y: c.read_i16()?,
        }),
        K::Rectangle2d => Value::Rectangle2d(Rectangle2d {
            top: c.read_i16()?,
            left: c.read_i16()?,
            bottom: c.read_i16()?,
            right: c.read_i16()?,
        }),
        K::Vector2d => Value::Vector2d(read_vector2d(c)?),
        K::Vector3d => Value::Vector3d(read_vector3d(c)?),
        K::Vector4d => Value::Vector4d(Vector4d {
            x: c.read_f32()?,
            y: c.read_f32()?,
            z: c.read_f32()?,
            w: c.read_f32()?,
        }),
        K::Quaternion => Value::Quaternion(Quaternion {
            i: c.read_f32()?,
            j: c.read_f32()?,
            k: c.read_f32()?,
            w: c.read_f32()?,
        }),
        K::Euler2d => Value::Euler2d(Euler2d {
            yaw: read_angle(c)?,
            pitch: read_angle(c)?,
        }),
        K::Euler3d => Value::Euler3d(Euler3d {
            yaw: read_angle(c)?,
            pitch: read_angle(c)?,
            roll: read_angle(c)?,
        }),
        K::Plane2d => Value::Plane2d(Plane2d {
            normal: read_vector2d(c)?,
            distance: c.read_f32()?,
        }),
        K::Plane3d => Value::Plane3d(Plane3d {
            normal: read_vector3d(c)?,
            distance: c.read_f32()?,
        }),
        K::RgbColor => Value::RgbColor(RgbColor {
            r: c.read_f32()?,
            g: c.read_f32()?,
            b: c.read_f32()?,
        }),
        K::ArgbColor => Value::ArgbColor(ArgbColor {
            a: c.read_f32()?,
            r: c.read_f32()?,
            g: c.read_f32()?,
            b: c.read_f32()?,
        }),
        K::ShortBounds => Value::ShortBounds(Bounds {
            min: c.read_i16()?,
            max: c.read_i16()?,
        }),
        K::RealBounds => Value::RealBounds(Bounds {
            min: c.read_f32()?,
            max: c.read_f32()?,
        }),
        K::RealFractionBounds => Value::RealFractionBounds(Bounds {
            min: c.read_f32()?,
            max: c.read_f32()?,
        }),
        K::AngleBounds => Value::AngleBounds(Bounds {
            min: read_angle(c)?,
            max: read_angle(c)?,
        }),
        K::String => Value::String(read_fixed_string(c, STRING_SIZE)?),
        K::LongString => Value::LongString(read_fixed_string(c, LONG_STRING_SIZE)?),
        K::Tag => Value::Tag(c.read_tag()?),
        K::Pad { .. } | K::Struct { .. } | K::Block { .. } | K::TagRef { .. } | K::StringId | K::Data => {
            return Ok(None)
        }
    };
    Ok(Some(value))
}

fn write_vector2d(w: &mut Writer, v: &Vector2d) {
    w.write_f32(v.x);
    w.write_f32(v.y);
}

fn write_vector3d(w: &mut Writer, v: &Vector3d) {
    w.write_f32(v.x);
    w.write_f32(v.y);
    w.write_f32(v.z);
}

fn write_angle(w: &mut Writer, degrees: f64) {
    w.write_f32(angle_to_disk(degrees));
}

fn write_fixed_string(w: &mut Writer, field: &str, s: &str, width: usize) -> Result<()> {
    let mismatch = || Error::ValueMismatch {
        field: field.to_string(),
        expected: "Latin-1 string that fits its fixed width",
    };
    let bytes = latin1_encode(s).ok_or_else(mismatch)?;
    if bytes.len() > width {
        return Err(mismatch());
    }
    w.write_bytes(&bytes);
    w.pad(width - bytes.len());
    Ok(())
}

/// Write a primitive field. `field` names the field in errors.
pub fn write(w: &mut Writer, kind: &FieldKind, value: &Value, field: &str) -> Result<()> {
    use FieldKind as K;
    let mismatch = |expected: &'static str| Error::ValueMismatch {
        field: field.to_string(),
        expected,
    };
    match (kind, value) {
        (K::Char, Value::Char(v)) => w.write_i8(*v),
        (K::Short, Value::Short(v)) => w.write_i16(*v),
        (K::Long, Value::Long(v)) => w.write_i32(*v),
        (K::Byte, Value::Byte(v)) => w.write_u8(*v),
        (K::Word, Value::Word(v)) => w.write_u16(*v),
        (K::Dword, Value::Dword(v)) => w.write_u32(*v),
        (K::Real, Value::Real(v)) | (K::RealFraction, Value::RealFraction(v)) => w.write_f32(*v),
        (K::Angle, Value::Angle(v)) => write_angle(w, *v),
        (K::CharEnum { .. }, Value::Enum(e)) => {
            w.write_i8(i8::try_from(e.raw).map_err(|_| mismatch("8-bit enum"))?)
        }
        (K::ShortEnum { .. }, Value::Enum(e)) => {
            w.write_i16(i16::try_from(e.raw).map_err(|_| mismatch("16-bit enum"))?)
        }
        (K::LongEnum { .. }, Value::Enum(e)) => w.write_i32(e.raw),
        (K::ByteFlags { .. }, Value::Flags(f)) => {
            w.write_u8(u8::try_from(f.raw).map_err(|_| mismatch("8-bit flags"))?)
        }
        (K::WordFlags { .. }, Value::Flags(f)) => {
            w.write_u16(u16::try_from(f.raw).map_err(|_| mismatch("16-bit flags"))?)
        }
        (K::LongFlags { .. }, Value::Flags(f)) => w.write_u32(f.raw),
        (K::Point2d, Value::Point2d(p)) => {
            w.write_i16(p.x);
            w.write_i16(p.y);
        }
        (K::Rectangle2d, Value::Rectangle2d(r)) => {
            w.write_i16(r.top);
            w.write_i16(r.left);
            w.write_i16(r.bottom);
            w.write_i16(r.right);
        }
        (K::Vector2d, Value::Vector2d(v)) => write_vector2d(w, v),
        (K::Vector3d, Value::Vector3d(v)) => write_vector3d(w, v),
        (K::Vector4d, Value::Vector4d(v)) => {
            w.write_f32(v.x);
            w.write_f32(v.y);
            w.write_f32(v.z);
            w.write_f32(v.w);
        }
        (K::Quaternion, Value::Quaternion(q)) => {
            w.write_f32(q.i);
            w.write_f32(q.j);
            w.write_f32(q.k);
            w.write_f32(q.w);
        }
        (K::Euler2d, Value::Euler2d(e)) => {
            write_angle(w, e.yaw);
            write_angle(w, e.pitch);
        }
        (K::Euler3d, Value::Euler3d(e)) => {
            write_angle(w, e.yaw);
            write_angle(w, e.pitch);
            write_angle(w, e.roll);
        }
        (K::Plane2d, Value::Plane2d(p)) => {
            write_vector2d(w, &p.normal);
            w.write_f32(p.distance);
        }
        (K::Plane3d, Value::Plane3d(p)) => {
            write_vector3d(w, &p.normal);
            w.write_f32(p.distance);
        }
        (K::RgbColor, Value::RgbColor(c)) => {
            w.write_f32(c.r);
            w.write_f32(c.g);
            w.write_f32(c.b);
        }
        (K::ArgbColor, Value::ArgbColor(c)) => {
            w.write_f32(c.a);
            w.write_f32(c.r);
            w.write_f32(c.g);
            w.write_f32(c.b);
        }
        (K::ShortBounds, Value::ShortBounds(b)) => {
            w.write_i16(b.min);
            w.write_i16(b.max);
        }
        (K::RealBounds, Value::RealBounds(b)) | (K::RealFractionBounds, Value::RealFractionBounds(b)) => {
            w.write_f32(b.min);
            w.write_f32(b.max);
        }
        (K::AngleBounds, Value::AngleBounds(b)) => {
            write_angle(w, b.min);
            write_angle(w, b.max);
        }
        (K::String, Value::String(s)) => write_fixed_string(w, field, s, STRING_SIZE)?,
        (K::LongString, Value::LongString(s)) => write_fixed_string(w, field, s, LONG_STRING_SIZE)?,
        (K::Tag, Value::Tag(t)) => w.write_tag(*t),
        (kind, _) => return Err(mismatch(kind.type_name())),
    }
    Ok(())
}
