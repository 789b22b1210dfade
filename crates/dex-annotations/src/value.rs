//! Encoded value types and the per-type payload table
//!
//! Every encoded value starts with a header byte:
//!
//! ```text
//!  7   5 4       0
//! +-----+---------+
//! | arg |  type   |
//! +-----+---------+
//! ```
//!
//! For sized types `arg + 1` payload bytes follow. Booleans keep their
//! value in `arg`, null has no payload, and arrays and annotations are
//! followed by uleb128-prefixed sequences of nested values.
//!
//! Decoding and skipping both dispatch on [`ValueType::shape`], so the two
//! traversals always agree on how many bytes a value occupies.

use crate::error::DecodeError;
use crate::reader::EncodedReader;
use crate::types::{PrimitiveType, StringIndex, TypeIndex};

/// Mask selecting the type bits of a header byte
pub const VALUE_TYPE_MASK: u8 = 0x1f;

/// Shift selecting the argument bits of a header byte
pub const VALUE_ARG_SHIFT: u8 = 5;

/// Encoded value type tags
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Signed 8-bit integer
    Byte = 0x00,
    /// Signed 16-bit integer
    Short = 0x02,
    /// Unsigned 16-bit code unit
    Char = 0x03,
    /// Signed 32-bit integer
    Int = 0x04,
    /// Signed 64-bit integer
    Long = 0x06,
    /// 32-bit IEEE float, right-justified
    Float = 0x10,
    /// 64-bit IEEE double, right-justified
    Double = 0x11,
    /// String table index
    String = 0x17,
    /// Type table index
    Type = 0x18,
    /// Field table index
    Field = 0x19,
    /// Method table index
    Method = 0x1a,
    /// Field table index of an enum constant
    Enum = 0x1b,
    /// Array of encoded values
    Array = 0x1c,
    /// Nested annotation
    Annotation = 0x1d,
    /// Null reference
    Null = 0x1e,
    /// Boolean stored in the header argument
    Boolean = 0x1f,
}

/// How the payload following a header byte is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `arg + 1` little-endian bytes
    Sized,
    /// No payload bytes
    Empty,
    /// uleb128 size, then that many values
    Array,
    /// uleb128 type index, uleb128 count, then (uleb128 name, value) pairs
    Annotation,
}

impl ValueType {
    /// Convert a type tag to a value type
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Byte),
            0x02 => Some(Self::Short),
            0x03 => Some(Self::Char),
            0x04 => Some(Self::Int),
            0x06 => Some(Self::Long),
            0x10 => Some(Self::Float),
            0x11 => Some(Self::Double),
            0x17 => Some(Self::String),
            0x18 => Some(Self::Type),
            0x19 => Some(Self::Field),
            0x1a => Some(Self::Method),
            0x1b => Some(Self::Enum),
            0x1c => Some(Self::Array),
            0x1d => Some(Self::Annotation),
            0x1e => Some(Self::Null),
            0x1f => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Convert to the type tag
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Payload layout for this type
    pub fn shape(self) -> PayloadShape {
        match self {
            Self::Byte
            | Self::Short
            | Self::Char
            | Self::Int
            | Self::Long
            | Self::Float
            | Self::Double
            | Self::String
            | Self::Type
            | Self::Field
            | Self::Method
            | Self::Enum => PayloadShape::Sized,
            Self::Boolean | Self::Null => PayloadShape::Empty,
            Self::Array => PayloadShape::Array,
            Self::Annotation => PayloadShape::Annotation,
        }
    }

    /// Largest legal header argument
    pub fn max_arg(self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::Short | Self::Char => 1,
            Self::Int | Self::Float => 3,
            Self::String | Self::Type | Self::Field | Self::Method | Self::Enum => 3,
            Self::Long | Self::Double => 7,
            Self::Boolean => 1,
            Self::Null | Self::Array | Self::Annotation => 0,
        }
    }

    /// The unboxed primitive this type decodes to, if any
    pub fn primitive_type(self) -> Option<PrimitiveType> {
        match self {
            Self::Byte => Some(PrimitiveType::Byte),
            Self::Short => Some(PrimitiveType::Short),
            Self::Char => Some(PrimitiveType::Char),
            Self::Int => Some(PrimitiveType::Int),
            Self::Long => Some(PrimitiveType::Long),
            Self::Float => Some(PrimitiveType::Float),
            Self::Double => Some(PrimitiveType::Double),
            Self::Boolean => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }

    /// Whether values of this type are indices into a container table
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::String | Self::Type | Self::Field | Self::Method | Self::Enum
        )
    }
}

/// A parsed and validated header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueHeader {
    /// Value type
    pub value_type: ValueType,
    /// Raw argument bits
    pub arg: u8,
}

impl ValueHeader {
    /// Read and validate a header byte
    pub fn read(reader: &mut EncodedReader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.position();
        let byte = reader.read_u8()?;
        let tag = byte & VALUE_TYPE_MASK;
        let arg = byte >> VALUE_ARG_SHIFT;
        let value_type = ValueType::from_u8(tag).ok_or(DecodeError::InvalidValueType {
            value_type: tag,
            offset,
        })?;
        if arg > value_type.max_arg() {
            return Err(DecodeError::InvalidValueArg {
                value_type,
                arg,
                offset,
            });
        }
        Ok(Self { value_type, arg })
    }

    /// Payload width in bytes for sized types
    #[inline]
    pub fn width(&self) -> usize {
        usize::from(self.arg) + 1
    }
}

/// An unboxed scalar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `char`, a UTF-16 code unit
    Char(u16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
}

impl Primitive {
    /// The primitive type of this value
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Byte(_) => PrimitiveType::Byte,
            Self::Short(_) => PrimitiveType::Short,
            Self::Char(_) => PrimitiveType::Char,
            Self::Int(_) => PrimitiveType::Int,
            Self::Long(_) => PrimitiveType::Long,
            Self::Float(_) => PrimitiveType::Float,
            Self::Double(_) => PrimitiveType::Double,
        }
    }

    /// The value's bit pattern, zero-extended to 64 bits
    pub fn to_bits(&self) -> u64 {
        match *self {
            Self::Boolean(b) => u64::from(b),
            Self::Byte(v) => u64::from(v as u8),
            Self::Short(v) => u64::from(v as u16),
            Self::Char(v) => u64::from(v),
            Self::Int(v) => u64::from(v as u32),
            Self::Long(v) => v as u64,
            Self::Float(v) => u64::from(v.to_bits()),
            Self::Double(v) => v.to_bits(),
        }
    }
}

/// A fully decoded value with every reference left as its raw index.
///
/// This is what the codec's decode mode produces. Nested arrays and
/// annotations are decoded recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Scalar payload
    Primitive(Primitive),
    /// The null reference
    Null,
    /// String/Type/Field/Method/Enum index
    Reference {
        /// Which table `index` points into
        value_type: ValueType,
        /// Raw table index
        index: u32,
    },
    /// Decoded array elements
    Array(Vec<RawValue>),
    /// Nested annotation
    Annotation(RawAnnotation),
}

impl RawValue {
    /// The encoded type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Primitive(p) => match p {
                Primitive::Boolean(_) => ValueType::Boolean,
                Primitive::Byte(_) => ValueType::Byte,
                Primitive::Short(_) => ValueType::Short,
                Primitive::Char(_) => ValueType::Char,
                Primitive::Int(_) => ValueType::Int,
                Primitive::Long(_) => ValueType::Long,
                Primitive::Float(_) => ValueType::Float,
                Primitive::Double(_) => ValueType::Double,
            },
            Self::Null => ValueType::Null,
            Self::Reference { value_type, .. } => *value_type,
            Self::Array(_) => ValueType::Array,
            Self::Annotation(_) => ValueType::Annotation,
        }
    }
}

/// A decoded nested annotation with raw element values
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    /// Annotation class
    pub type_index: TypeIndex,
    /// Member name and value pairs in encoded order
    pub elements: Vec<(StringIndex, RawValue)>,
}
