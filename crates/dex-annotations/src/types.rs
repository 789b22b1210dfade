//! Container indices and target element types

use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(
    /// Index into the container's string table
    StringIndex
);
index_type!(
    /// Index into the container's type table
    TypeIndex
);
index_type!(
    /// Index into the container's field table
    FieldIndex
);
index_type!(
    /// Index into the container's method table
    MethodIndex
);

/// Primitive element types an annotation array can store unboxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `C`
    Char,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
}

impl PrimitiveType {
    /// Parse a single-character primitive descriptor
    pub fn from_descriptor_char(c: char) -> Option<Self> {
        match c {
            'Z' => Some(Self::Boolean),
            'B' => Some(Self::Byte),
            'S' => Some(Self::Short),
            'C' => Some(Self::Char),
            'I' => Some(Self::Int),
            'J' => Some(Self::Long),
            'F' => Some(Self::Float),
            'D' => Some(Self::Double),
            _ => None,
        }
    }

    /// The descriptor character for this type
    pub fn descriptor_char(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Char => 'C',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
        }
    }
}

/// The declared type of an array element (or of an annotation member).
///
/// Reference types keep their full type descriptor, so an element type
/// of `[I` describes an array whose elements are `int[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Unboxed primitive
    Primitive(PrimitiveType),
    /// Reference type, by descriptor (`Ljava/lang/String;`, `[I`, ...)
    Reference(String),
}

impl ElementType {
    /// Build an element type from a type descriptor
    pub fn from_descriptor(descriptor: &str) -> Self {
        let mut chars = descriptor.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => match PrimitiveType::from_descriptor_char(c) {
                Some(primitive) => Self::Primitive(primitive),
                None => Self::Reference(descriptor.to_string()),
            },
            _ => Self::Reference(descriptor.to_string()),
        }
    }

    /// Element type of an array of `descriptor`
    pub fn array_of(descriptor: &str) -> Self {
        Self::Reference(format!("[{descriptor}"))
    }

    /// The descriptor of this type
    pub fn descriptor(&self) -> String {
        match self {
            Self::Primitive(p) => p.descriptor_char().to_string(),
            Self::Reference(d) => d.clone(),
        }
    }

    /// Whether this type is an unboxed primitive
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// For an array type, the type of its elements
    pub fn component(&self) -> Option<ElementType> {
        match self {
            Self::Reference(d) => d.strip_prefix('[').map(Self::from_descriptor),
            Self::Primitive(_) => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p.descriptor_char()),
            Self::Reference(d) => f.write_str(d),
        }
    }
}
