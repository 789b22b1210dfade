//! Error types for annotation decoding and materialization

use crate::types::{ElementType, TypeIndex};
use crate::value::ValueType;
use thiserror::Error;

/// Format violations found while decoding an annotation byte stream.
///
/// These are never recoverable: the container is corrupt or was produced
/// by an incompatible encoder. Every offset is relative to the start of
/// the slice the reader was created over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unexpected end of the encoded data
    #[error("Unexpected end of annotation data at offset {0}")]
    UnexpectedEnd(usize),

    /// LEB128 value longer than five bytes
    #[error("Malformed uleb128 value at offset {0}")]
    MalformedLeb128(usize),

    /// Unknown value type in a header byte
    #[error("Bad annotation element value type {value_type:#04x} at offset {offset}")]
    InvalidValueType {
        /// Low five bits of the header byte
        value_type: u8,
        /// Offset of the header byte
        offset: usize,
    },

    /// Value argument too wide for its type
    #[error("Value argument {arg} is out of range for {value_type:?} at offset {offset}")]
    InvalidValueArg {
        /// Type from the header
        value_type: ValueType,
        /// High three bits of the header byte
        arg: u8,
        /// Offset of the header byte
        offset: usize,
    },

    /// Unknown visibility byte in an annotation item
    #[error("Unknown annotation visibility {0:#04x}")]
    InvalidVisibility(u8),

    /// String index outside the string table
    #[error("String index {0} is out of range")]
    InvalidStringIndex(u32),

    /// Type index outside the type table
    #[error("Type index {0} is out of range")]
    InvalidTypeIndex(u32),

    /// A value of this type cannot appear where it was found
    #[error("Unexpected {value_type:?} value at offset {offset}")]
    UnexpectedValueType {
        /// Type from the header
        value_type: ValueType,
        /// Offset of the header byte
        offset: usize,
    },

    /// A method carries both FastNative and CriticalNative
    #[error("Method is annotated with both FastNative and CriticalNative")]
    ConflictingNativeAnnotations,
}

/// Failure reported by a [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Symbol has no live counterpart
    #[error("Unable to resolve {kind} index {index}")]
    Unresolved {
        /// Table the index belongs to
        kind: SymbolKind,
        /// The index that failed
        index: u32,
    },

    /// Object construction failed in the runtime
    #[error("Failed to construct {0}")]
    Construction(String),
}

/// Kind of symbol a resolution request refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// String table entry
    String,
    /// Type (class) reference
    Type,
    /// Method reference
    Method,
    /// Field reference
    Field,
    /// Enum constant (a static field of the enum class)
    Enum,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::String => "string",
            SymbolKind::Type => "type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Errors produced by the value materializer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterializeError {
    /// Format violation in the encoded data
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Resolution service failure
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// An array value was found but no element type was supplied
    #[error("Array value without an expected element type")]
    MissingArrayType,

    /// A decoded element cannot be stored in the expected array
    #[error("Cannot store {found:?} in an array of {expected}")]
    ElementTypeMismatch {
        /// Component type of the array
        expected: ElementType,
        /// Type of the decoded element
        found: ValueType,
    },

    /// The annotation class has no member with the encoded name
    #[error("Annotation has no member named '{0}'")]
    UnknownMember(String),

    /// The class of a nested or top-level annotation could not be resolved.
    /// The resolver's pending failure has already been cleared.
    #[error("Unable to resolve annotation class (type index {0})")]
    AnnotationClassUnresolved(TypeIndex),
}

impl MaterializeError {
    /// Returns the format violation behind this error, if any
    pub fn as_decode_error(&self) -> Option<&DecodeError> {
        match self {
            MaterializeError::Decode(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the annotation that produced this error should simply be
    /// left out of an annotation set
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            MaterializeError::AnnotationClassUnresolved(_) | MaterializeError::UnknownMember(_)
        )
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}
