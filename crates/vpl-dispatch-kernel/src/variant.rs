//! Typed filter values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag carried by every filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum VariantType {
    Unset = 0,
    U8 = 1,
    I8 = 2,
    U16 = 3,
    I16 = 4,
    U32 = 5,
    I32 = 6,
    U64 = 7,
    I64 = 8,
    F32 = 9,
    F64 = 10,
    Ptr = 11,
}

impl VariantType {
    pub fn from_raw(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => VariantType::Unset,
            1 => VariantType::U8,
            2 => VariantType::I8,
            3 => VariantType::U16,
            4 => VariantType::I16,
            5 => VariantType::U32,
            6 => VariantType::I32,
            7 => VariantType::U64,
            8 => VariantType::I64,
            9 => VariantType::F32,
            10 => VariantType::F64,
            11 => VariantType::Ptr,
            _ => return None,
        })
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::Unset => "unset",
            VariantType::U8 => "u8",
            VariantType::I8 => "i8",
            VariantType::U16 => "u16",
            VariantType::I16 => "i16",
            VariantType::U32 => "u32",
            VariantType::I32 => "i32",
            VariantType::U64 => "u64",
            VariantType::I64 => "i64",
            VariantType::F32 => "f32",
            VariantType::F64 => "f64",
            VariantType::Ptr => "pointer",
        };
        f.write_str(name)
    }
}

/// An inclusive `{min, max, step}` range as advertised for surface sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct Range32U {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Range32U {
    pub const fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    /// Whether `requested` lies entirely within this advertised range.
    ///
    /// The requested step must be a non-zero multiple of the advertised
    /// step; an advertised step of zero places no constraint on it.
    pub fn contains(&self, requested: &Range32U) -> bool {
        if requested.min > requested.max {
            return false;
        }
        if requested.min < self.min || requested.max > self.max {
            return false;
        }
        match self.step {
            0 => true,
            step => requested.step != 0 && requested.step % step == 0,
        }
    }
}

impl fmt::Display for Range32U {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..={} step {}]", self.min, self.max, self.step)
    }
}

/// A filter value. String and range payloads travel as pointers on the wire
/// and therefore share the [`VariantType::Ptr`] tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Range(Range32U),
}

impl PropertyValue {
    pub fn variant_type(&self) -> VariantType {
        match self {
            PropertyValue::U8(_) => VariantType::U8,
            PropertyValue::I8(_) => VariantType::I8,
            PropertyValue::U16(_) => VariantType::U16,
            PropertyValue::I16(_) => VariantType::I16,
            PropertyValue::U32(_) => VariantType::U32,
            PropertyValue::I32(_) => VariantType::I32,
            PropertyValue::U64(_) => VariantType::U64,
            PropertyValue::I64(_) => VariantType::I64,
            PropertyValue::F32(_) => VariantType::F32,
            PropertyValue::F64(_) => VariantType::F64,
            PropertyValue::String(_) | PropertyValue::Range(_) => VariantType::Ptr,
        }
    }

    /// Integer payload widened without loss, if this is an integer value.
    pub fn as_integer(&self) -> Option<i128> {
        Some(match *self {
            PropertyValue::U8(v) => v.into(),
            PropertyValue::I8(v) => v.into(),
            PropertyValue::U16(v) => v.into(),
            PropertyValue::I16(v) => v.into(),
            PropertyValue::U32(v) => v.into(),
            PropertyValue::I32(v) => v.into(),
            PropertyValue::U64(v) => v.into(),
            PropertyValue::I64(v) => v.into(),
            _ => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range32U> {
        match self {
            PropertyValue::Range(r) => Some(r),
            _ => None,
        }
    }
}

impl From<u16> for PropertyValue {
    fn from(v: u16) -> Self {
        PropertyValue::U16(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::U32(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<Range32U> for PropertyValue {
    fn from(v: Range32U) -> Self {
        PropertyValue::Range(v)
    }
}
