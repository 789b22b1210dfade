//! Value materialization
//!
//! Turns encoded values into one of three output representations,
//! selected at runtime by [`ResultStyle`]:
//!
//! | style                 | scalars  | references          | arrays / annotations |
//! |-----------------------|----------|---------------------|----------------------|
//! | `Raw`                 | unboxed  | raw index           | raw decoded tree     |
//! | `AllObjects`          | boxed    | resolved            | built objects        |
//! | `PrimitivesOrObjects` | unboxed  | resolved            | built objects        |
//!
//! Under `AllObjects` an unresolvable type becomes a "type not present"
//! placeholder; every other unresolved reference fails the call.

use crate::codec::{self, bounded_capacity};
use crate::error::{DecodeError, MaterializeError, ResolveError};
use crate::reader::EncodedReader;
use crate::resolver::{string_data, type_descriptor, AnnotationMember, Resolver, StringTable};
use crate::types::{ElementType, FieldIndex, MethodIndex, PrimitiveType, StringIndex, TypeIndex};
use crate::value::{PayloadShape, Primitive, RawValue, ValueHeader, ValueType};

/// Output policy for materialized values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStyle {
    /// Literal stored integers and bits; no resolution
    Raw,
    /// Everything boxed or resolved into a reference
    AllObjects,
    /// Scalars unboxed, everything else resolved
    PrimitivesOrObjects,
}

/// Payload of a materialized value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<O> {
    /// Unboxed scalar
    Primitive(Primitive),
    /// Unresolved table index (raw style only)
    Index(u32),
    /// Null reference
    Null,
    /// Live reference
    Object(O),
    /// Decoded but unresolved array or annotation (raw style only)
    Raw(RawValue),
}

/// A materialized value together with its encoded type
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationValue<O> {
    /// Encoded type of the value
    pub value_type: ValueType,
    /// The value itself, shaped by the result style
    pub payload: Payload<O>,
}

impl<O> AnnotationValue<O> {
    fn new(value_type: ValueType, payload: Payload<O>) -> Self {
        Self {
            value_type,
            payload,
        }
    }

    /// The live reference, if this value holds one
    pub fn into_object(self) -> Option<O> {
        match self.payload {
            Payload::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The unboxed scalar, if this value holds one
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.payload {
            Payload::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// The raw table index, if this value holds one
    pub fn as_index(&self) -> Option<u32> {
        match self.payload {
            Payload::Index(index) => Some(index),
            _ => None,
        }
    }

    /// Whether this value is an encoded null
    pub fn is_null(&self) -> bool {
        matches!(self.payload, Payload::Null)
    }
}

/// Typed element storage for an array under construction.
///
/// Primitive element types get a dedicated vector so that values are
/// never boxed; reference element types share the object store.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStore<O> {
    /// `boolean[]`
    Boolean(Vec<bool>),
    /// `byte[]`
    Byte(Vec<i8>),
    /// `short[]`
    Short(Vec<i16>),
    /// `char[]`
    Char(Vec<u16>),
    /// `int[]`
    Int(Vec<i32>),
    /// `long[]`
    Long(Vec<i64>),
    /// `float[]`
    Float(Vec<f32>),
    /// `double[]`
    Double(Vec<f64>),
    /// Reference elements; `None` is a null element
    Object(Vec<Option<O>>),
}

impl<O> ArrayStore<O> {
    /// Allocate storage for `capacity` elements of `element_type`
    pub fn with_capacity(element_type: &ElementType, capacity: usize) -> Self {
        match element_type {
            ElementType::Primitive(p) => match p {
                PrimitiveType::Boolean => Self::Boolean(Vec::with_capacity(capacity)),
                PrimitiveType::Byte => Self::Byte(Vec::with_capacity(capacity)),
                PrimitiveType::Short => Self::Short(Vec::with_capacity(capacity)),
                PrimitiveType::Char => Self::Char(Vec::with_capacity(capacity)),
                PrimitiveType::Int => Self::Int(Vec::with_capacity(capacity)),
                PrimitiveType::Long => Self::Long(Vec::with_capacity(capacity)),
                PrimitiveType::Float => Self::Float(Vec::with_capacity(capacity)),
                PrimitiveType::Double => Self::Double(Vec::with_capacity(capacity)),
            },
            ElementType::Reference(_) => Self::Object(Vec::with_capacity(capacity)),
        }
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    /// Whether no elements are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route one materialized element into its typed slot
    fn push(
        &mut self,
        element_type: &ElementType,
        value: AnnotationValue<O>,
    ) -> Result<(), MaterializeError> {
        let found = value.value_type;
        let mismatch = || MaterializeError::ElementTypeMismatch {
            expected: element_type.clone(),
            found,
        };
        match (self, value.payload) {
            (Self::Boolean(v), Payload::Primitive(Primitive::Boolean(x))) => v.push(x),
            (Self::Byte(v), Payload::Primitive(Primitive::Byte(x))) => v.push(x),
            (Self::Short(v), Payload::Primitive(Primitive::Short(x))) => v.push(x),
            (Self::Char(v), Payload::Primitive(Primitive::Char(x))) => v.push(x),
            (Self::Int(v), Payload::Primitive(Primitive::Int(x))) => v.push(x),
            (Self::Long(v), Payload::Primitive(Primitive::Long(x))) => v.push(x),
            (Self::Float(v), Payload::Primitive(Primitive::Float(x))) => v.push(x),
            (Self::Double(v), Payload::Primitive(Primitive::Double(x))) => v.push(x),
            (Self::Object(v), Payload::Object(o)) => v.push(Some(o)),
            (Self::Object(v), Payload::Null) => v.push(None),
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

/// Drives the codec's decode mode and resolves what it decodes.
///
/// Holds the string table and the resolution service for the duration of
/// one top-level call; nothing is cached between calls.
pub struct Materializer<'r, S: ?Sized, R> {
    strings: &'r S,
    resolver: &'r mut R,
}

impl<'r, S, R> Materializer<'r, S, R>
where
    S: StringTable + ?Sized,
    R: Resolver,
{
    /// Create a materializer over a string table and a resolver
    pub fn new(strings: &'r S, resolver: &'r mut R) -> Self {
        Self { strings, resolver }
    }

    /// The resolver used by this materializer
    pub fn resolver(&mut self) -> &mut R {
        &mut *self.resolver
    }

    /// Materialize the value at the reader's position.
    ///
    /// `element_type` is the element type of the target array; it is
    /// required whenever the encoded value is an array and `style` is not
    /// [`ResultStyle::Raw`].
    pub fn materialize(
        &mut self,
        reader: &mut EncodedReader<'_>,
        element_type: Option<&ElementType>,
        style: ResultStyle,
    ) -> Result<AnnotationValue<R::Object>, MaterializeError> {
        let offset = reader.position();
        let header = ValueHeader::read(reader)?;
        let value_type = header.value_type;

        let payload = match value_type.shape() {
            PayloadShape::Sized | PayloadShape::Empty => {
                match codec::decode_scalar(header, reader)? {
                    RawValue::Primitive(p) if style == ResultStyle::AllObjects => {
                        Payload::Object(self.resolver.box_primitive(p))
                    }
                    RawValue::Primitive(p) => Payload::Primitive(p),
                    RawValue::Null => Payload::Null,
                    RawValue::Reference { index, .. } if style == ResultStyle::Raw => {
                        Payload::Index(index)
                    }
                    RawValue::Reference { value_type, index } => {
                        Payload::Object(self.resolve_reference(value_type, index, style, offset)?)
                    }
                    container => Payload::Raw(container),
                }
            }
            PayloadShape::Array | PayloadShape::Annotation if style == ResultStyle::Raw => {
                Payload::Raw(codec::decode_payload(header, reader)?)
            }
            PayloadShape::Array => {
                let element_type = element_type.ok_or(MaterializeError::MissingArrayType)?;
                Payload::Object(self.materialize_array(reader, element_type)?)
            }
            PayloadShape::Annotation => Payload::Object(self.materialize_annotation(reader)?),
        };

        Ok(AnnotationValue::new(value_type, payload))
    }

    /// Build an annotation instance from an encoded annotation body
    /// (type index, element count, named elements).
    ///
    /// An annotation class that cannot be resolved is reported as
    /// [`MaterializeError::AnnotationClassUnresolved`] with the pending
    /// failure cleared.
    pub fn materialize_annotation(
        &mut self,
        reader: &mut EncodedReader<'_>,
    ) -> Result<R::Object, MaterializeError> {
        let type_index = TypeIndex(reader.read_uleb128()?);
        let count = reader.read_uleb128()?;

        let annotation_class = match self.resolver.resolve_type(type_index) {
            Ok(class) => class,
            Err(err) => {
                tracing::info!(%type_index, error = %err, "unable to resolve annotation class");
                self.resolver.clear_pending_failure();
                return Err(MaterializeError::AnnotationClassUnresolved(type_index));
            }
        };

        let mut members = Vec::with_capacity(bounded_capacity(count, reader));
        for _ in 0..count {
            let name_index = StringIndex(reader.read_uleb128()?);
            let name = string_data(self.strings, name_index)?;
            let member_type = self
                .resolver
                .annotation_member_type(&annotation_class, name)
                .ok_or_else(|| MaterializeError::UnknownMember(name.to_string()))?;
            let value = self.materialize(
                reader,
                member_type.component().as_ref(),
                ResultStyle::AllObjects,
            )?;
            members.push(AnnotationMember {
                name: name.to_string(),
                value: value.into_object(),
                element_type: member_type,
            });
        }

        Ok(self.resolver.new_annotation(&annotation_class, members)?)
    }

    fn materialize_array(
        &mut self,
        reader: &mut EncodedReader<'_>,
        element_type: &ElementType,
    ) -> Result<R::Object, MaterializeError> {
        let size = reader.read_uleb128()?;
        let mut store = ArrayStore::with_capacity(element_type, bounded_capacity(size, reader));
        let component = element_type.component();
        for _ in 0..size {
            let value =
                self.materialize(reader, component.as_ref(), ResultStyle::PrimitivesOrObjects)?;
            store.push(element_type, value)?;
        }
        Ok(self.resolver.new_array(element_type, store)?)
    }

    fn resolve_reference(
        &mut self,
        value_type: ValueType,
        index: u32,
        style: ResultStyle,
        offset: usize,
    ) -> Result<R::Object, MaterializeError> {
        let resolved = match value_type {
            ValueType::String => self.resolver.resolve_string(StringIndex(index)),
            ValueType::Type => return self.resolve_type_value(TypeIndex(index), style),
            ValueType::Method => self.resolver.resolve_method(MethodIndex(index)),
            ValueType::Field => self.resolver.resolve_field(FieldIndex(index)),
            ValueType::Enum => self.resolver.resolve_enum(FieldIndex(index)),
            other => {
                return Err(DecodeError::UnexpectedValueType {
                    value_type: other,
                    offset,
                }
                .into())
            }
        };
        Ok(resolved?)
    }

    fn resolve_type_value(
        &mut self,
        index: TypeIndex,
        style: ResultStyle,
    ) -> Result<R::Object, MaterializeError> {
        match self.resolver.resolve_type(index) {
            Ok(class) => Ok(class),
            Err(ResolveError::Unresolved { .. }) if style == ResultStyle::AllObjects => {
                let descriptor = type_descriptor(self.strings, index)?;
                let placeholder = self.resolver.type_not_present(descriptor);
                self.resolver.clear_pending_failure();
                Ok(placeholder)
            }
            Err(err) => Err(err.into()),
        }
    }
}
