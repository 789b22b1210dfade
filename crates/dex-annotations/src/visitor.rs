//! Depth-tracked structural walk over encoded annotations
//!
//! The visitor sees every element of an annotation body. For arrays and
//! nested annotations it decides whether to descend; anything it does not
//! descend into is skipped with the codec's skip mode, so the walk always
//! stays aligned with the encoded stream.
//!
//! Depth is absolute: top-level elements of the body are at depth 0, array
//! slots and nested annotation elements one level below their container.

use crate::codec::{self, skip_elements, skip_values};
use crate::error::DecodeError;
use crate::item::{AnnotationSet, Visibility};
use crate::reader::EncodedReader;
use crate::resolver::{string_data, StringTable};
use crate::types::{StringIndex, TypeIndex};
use crate::value::{PayloadShape, Primitive, RawValue, ValueHeader, ValueType};
use std::fmt;

/// What the walk does after a callback returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorStatus {
    /// Move on to the next sibling, skipping any children
    Continue,
    /// Walk the children of this array or annotation
    DescendInner,
    /// End the whole walk
    Stop,
}

/// Position of a visited value within its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKey<'a> {
    /// Named annotation element
    Name(&'a str),
    /// Array slot
    Index(u32),
}

impl fmt::Display for ElementKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Name(name) => f.write_str(name),
            ElementKey::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A value as presented to the visitor.
///
/// Containers only report their header; their contents arrive through
/// further callbacks if the visitor descends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisitedValue {
    /// Scalar value
    Primitive(Primitive),
    /// Null reference
    Null,
    /// Unresolved table reference
    Reference {
        /// Which table `index` points into
        value_type: ValueType,
        /// Raw table index
        index: u32,
    },
    /// Array header
    Array {
        /// Number of elements that follow
        size: u32,
    },
    /// Nested annotation header
    Annotation {
        /// Annotation class
        type_index: TypeIndex,
        /// Number of elements that follow
        element_count: u32,
    },
}

/// Callbacks invoked during a structural walk
pub trait AnnotationVisitor {
    /// Called once per annotation item by [`visit_annotation_set`]
    fn visit_annotation(&mut self, _descriptor: &str, _visibility: Visibility) -> VisitorStatus {
        VisitorStatus::DescendInner
    }

    /// Called for every element and array slot reached by the walk
    fn visit_element(
        &mut self,
        key: ElementKey<'_>,
        value: &VisitedValue,
        depth: u32,
    ) -> VisitorStatus;
}

/// Walk an annotation body (type index, element count, elements) starting
/// at the reader's position.
///
/// Returns [`VisitorStatus::Stop`] if the visitor ended the walk and
/// [`VisitorStatus::Continue`] otherwise.
pub fn visit_annotation_body<S, V>(
    strings: &S,
    reader: &mut EncodedReader<'_>,
    visitor: &mut V,
) -> Result<VisitorStatus, DecodeError>
where
    S: StringTable + ?Sized,
    V: AnnotationVisitor + ?Sized,
{
    reader.read_uleb128()?; // type index
    let count = reader.read_uleb128()?;
    visit_elements(strings, reader, visitor, count, 0)
}

/// Walk every item of an annotation set in stored order
pub fn visit_annotation_set<S, V>(
    strings: &S,
    set: &AnnotationSet<'_>,
    visitor: &mut V,
) -> Result<VisitorStatus, DecodeError>
where
    S: StringTable + ?Sized,
    V: AnnotationVisitor + ?Sized,
{
    for item in set.iter() {
        let descriptor = item.descriptor(strings)?;
        match visitor.visit_annotation(descriptor, item.visibility) {
            VisitorStatus::Stop => return Ok(VisitorStatus::Stop),
            VisitorStatus::Continue => {}
            VisitorStatus::DescendInner => {
                let mut reader = item.reader();
                if visit_annotation_body(strings, &mut reader, visitor)? == VisitorStatus::Stop {
                    return Ok(VisitorStatus::Stop);
                }
            }
        }
    }
    Ok(VisitorStatus::Continue)
}

fn visit_elements<S, V>(
    strings: &S,
    reader: &mut EncodedReader<'_>,
    visitor: &mut V,
    count: u32,
    depth: u32,
) -> Result<VisitorStatus, DecodeError>
where
    S: StringTable + ?Sized,
    V: AnnotationVisitor + ?Sized,
{
    for _ in 0..count {
        let name = string_data(strings, StringIndex(reader.read_uleb128()?))?;
        if visit_value(strings, reader, visitor, ElementKey::Name(name), depth)?
            == VisitorStatus::Stop
        {
            return Ok(VisitorStatus::Stop);
        }
    }
    Ok(VisitorStatus::Continue)
}

fn visit_value<S, V>(
    strings: &S,
    reader: &mut EncodedReader<'_>,
    visitor: &mut V,
    key: ElementKey<'_>,
    depth: u32,
) -> Result<VisitorStatus, DecodeError>
where
    S: StringTable + ?Sized,
    V: AnnotationVisitor + ?Sized,
{
    let header = ValueHeader::read(reader)?;
    match header.value_type.shape() {
        PayloadShape::Sized | PayloadShape::Empty => {
            let value = match codec::decode_scalar(header, reader)? {
                RawValue::Primitive(p) => VisitedValue::Primitive(p),
                RawValue::Null => VisitedValue::Null,
                RawValue::Reference { value_type, index } => {
                    VisitedValue::Reference { value_type, index }
                }
                RawValue::Array(values) => VisitedValue::Array {
                    size: values.len() as u32,
                },
                RawValue::Annotation(annotation) => VisitedValue::Annotation {
                    type_index: annotation.type_index,
                    element_count: annotation.elements.len() as u32,
                },
            };
            match visitor.visit_element(key, &value, depth) {
                VisitorStatus::Stop => Ok(VisitorStatus::Stop),
                _ => Ok(VisitorStatus::Continue),
            }
        }
        PayloadShape::Array => {
            let size = reader.read_uleb128()?;
            match visitor.visit_element(key, &VisitedValue::Array { size }, depth) {
                VisitorStatus::Stop => Ok(VisitorStatus::Stop),
                VisitorStatus::Continue => {
                    skip_values(size, reader)?;
                    Ok(VisitorStatus::Continue)
                }
                VisitorStatus::DescendInner => {
                    for index in 0..size {
                        let slot = ElementKey::Index(index);
                        if visit_value(strings, reader, visitor, slot, depth + 1)?
                            == VisitorStatus::Stop
                        {
                            return Ok(VisitorStatus::Stop);
                        }
                    }
                    Ok(VisitorStatus::Continue)
                }
            }
        }
        PayloadShape::Annotation => {
            let type_index = TypeIndex(reader.read_uleb128()?);
            let element_count = reader.read_uleb128()?;
            let value = VisitedValue::Annotation {
                type_index,
                element_count,
            };
            match visitor.visit_element(key, &value, depth) {
                VisitorStatus::Stop => Ok(VisitorStatus::Stop),
                VisitorStatus::Continue => {
                    skip_elements(element_count, reader)?;
                    Ok(VisitorStatus::Continue)
                }
                VisitorStatus::DescendInner => {
                    visit_elements(strings, reader, visitor, element_count, depth + 1)
                }
            }
        }
    }
}
