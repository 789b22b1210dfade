//! Annotation items, annotation sets and the per-class directory
//!
//! These types only borrow the container's bytes. Nothing is decoded until
//! a search or materialization step asks for it.

use crate::error::DecodeError;
use crate::reader::EncodedReader;
use crate::resolver::{type_descriptor, StringTable};
use crate::types::{FieldIndex, MethodIndex, TypeIndex};

/// Annotation retention as stored in an annotation item
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to tooling only
    Build = 0x00,
    /// Visible through reflection
    Runtime = 0x01,
    /// Used by the runtime itself
    System = 0x02,
}

impl Visibility {
    /// Convert a visibility byte
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0x00 => Ok(Self::Build),
            0x01 => Ok(Self::Runtime),
            0x02 => Ok(Self::System),
            other => Err(DecodeError::InvalidVisibility(other)),
        }
    }

    /// Convert to the visibility byte
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// One annotation item: a visibility and a borrowed annotation body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationItem<'a> {
    /// Retention of the annotation
    pub visibility: Visibility,
    /// Encoded annotation body (type index, element count, elements)
    pub annotation: &'a [u8],
}

impl<'a> AnnotationItem<'a> {
    /// Create an item from an already split visibility and body
    pub fn new(visibility: Visibility, annotation: &'a [u8]) -> Self {
        Self {
            visibility,
            annotation,
        }
    }

    /// Parse an item from its stored form: one visibility byte followed by
    /// the annotation body
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let (&visibility, annotation) = bytes.split_first().ok_or(DecodeError::UnexpectedEnd(0))?;
        Ok(Self::new(Visibility::from_u8(visibility)?, annotation))
    }

    /// Reader positioned at the start of the annotation body
    pub fn reader(&self) -> EncodedReader<'a> {
        EncodedReader::new(self.annotation)
    }

    /// Type index of the annotation, read from the head of the body
    pub fn type_index(&self) -> Result<TypeIndex, DecodeError> {
        Ok(TypeIndex(self.reader().read_uleb128()?))
    }

    /// Type descriptor of the annotation
    pub fn descriptor<'s, S: StringTable + ?Sized>(
        &self,
        strings: &'s S,
    ) -> Result<&'s str, DecodeError> {
        type_descriptor(strings, self.type_index()?)
    }
}

/// An ordered set of annotation items attached to one member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet<'a> {
    items: Vec<AnnotationItem<'a>>,
}

impl<'a> AnnotationSet<'a> {
    /// Create a set from items in stored order
    pub fn new(items: Vec<AnnotationItem<'a>>) -> Self {
        Self { items }
    }

    /// Parse a set from stored item byte ranges
    pub fn parse<I>(items: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let items = items
            .into_iter()
            .map(AnnotationItem::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    /// Items in stored order
    pub fn items(&self) -> &[AnnotationItem<'a>] {
        &self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate items in stored order
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationItem<'a>> {
        self.items.iter()
    }
}

/// Annotation sets of one class and its members.
///
/// Members without annotations simply have no entry. Lookups scan entries
/// in stored order, the way the container lays them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationsDirectory<'a> {
    class_annotations: Option<AnnotationSet<'a>>,
    fields: Vec<(FieldIndex, AnnotationSet<'a>)>,
    methods: Vec<(MethodIndex, AnnotationSet<'a>)>,
    parameters: Vec<(MethodIndex, Vec<Option<AnnotationSet<'a>>>)>,
}

impl<'a> AnnotationsDirectory<'a> {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the class-level annotation set
    pub fn with_class_annotations(mut self, set: AnnotationSet<'a>) -> Self {
        self.class_annotations = Some(set);
        self
    }

    /// Attach an annotation set to a field
    pub fn with_field(mut self, field: FieldIndex, set: AnnotationSet<'a>) -> Self {
        self.fields.push((field, set));
        self
    }

    /// Attach an annotation set to a method
    pub fn with_method(mut self, method: MethodIndex, set: AnnotationSet<'a>) -> Self {
        self.methods.push((method, set));
        self
    }

    /// Attach per-parameter annotation sets to a method, one slot per
    /// parameter; `None` marks a parameter without annotations
    pub fn with_parameters(
        mut self,
        method: MethodIndex,
        sets: Vec<Option<AnnotationSet<'a>>>,
    ) -> Self {
        self.parameters.push((method, sets));
        self
    }

    /// The class-level annotation set
    pub fn class_set(&self) -> Option<&AnnotationSet<'a>> {
        self.class_annotations.as_ref()
    }

    /// The annotation set of `field`
    pub fn field_set(&self, field: FieldIndex) -> Option<&AnnotationSet<'a>> {
        self.fields
            .iter()
            .find(|(index, _)| *index == field)
            .map(|(_, set)| set)
    }

    /// The annotation set of `method`
    pub fn method_set(&self, method: MethodIndex) -> Option<&AnnotationSet<'a>> {
        self.methods
            .iter()
            .find(|(index, _)| *index == method)
            .map(|(_, set)| set)
    }

    /// The per-parameter annotation sets of `method`
    pub fn parameter_sets(&self, method: MethodIndex) -> Option<&[Option<AnnotationSet<'a>>]> {
        self.parameters
            .iter()
            .find(|(index, _)| *index == method)
            .map(|(_, sets)| sets.as_slice())
    }
}
