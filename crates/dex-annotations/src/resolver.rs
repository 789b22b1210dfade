//! External collaborators: the string table and the resolution service
//!
//! The decoder never owns live objects. Everything that turns an index
//! into something the runtime can use goes through [`Resolver`], whose
//! implementation carries the resolution scope (symbol caches, defining
//! class loader and so on).

use crate::error::{DecodeError, ResolveError};
use crate::materialize::ArrayStore;
use crate::types::{ElementType, FieldIndex, MethodIndex, StringIndex, TypeIndex};
use crate::value::Primitive;
use std::fmt;

/// Read-only view of the container's string and type tables
pub trait StringTable {
    /// The string at `index`
    fn string(&self, index: StringIndex) -> Option<&str>;

    /// The type descriptor at `index` (e.g. `Ljava/lang/Deprecated;`)
    fn type_descriptor(&self, index: TypeIndex) -> Option<&str>;
}

/// Look up a string, treating a missing entry as a format violation
pub fn string_data<S: StringTable + ?Sized>(
    strings: &S,
    index: StringIndex,
) -> Result<&str, DecodeError> {
    strings
        .string(index)
        .ok_or(DecodeError::InvalidStringIndex(index.0))
}

/// Look up a type descriptor, treating a missing entry as a format violation
pub fn type_descriptor<S: StringTable + ?Sized>(
    strings: &S,
    index: TypeIndex,
) -> Result<&str, DecodeError> {
    strings
        .type_descriptor(index)
        .ok_or(DecodeError::InvalidTypeIndex(index.0))
}

/// One named member of an annotation under construction
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationMember<O> {
    /// Member (element) name
    pub name: String,
    /// Materialized value; `None` for an encoded null
    pub value: Option<O>,
    /// Declared type of the member
    pub element_type: ElementType,
}

/// Resolution service mapping container indices to live references.
///
/// Failed resolutions may leave a pending failure in the implementation
/// (an exception in a managed runtime). The materializer calls
/// [`Resolver::clear_pending_failure`] whenever it swallows a failure, and
/// leaves it in place whenever the failure is reported to the caller.
pub trait Resolver {
    /// Live reference type produced by this resolver
    type Object: Clone + PartialEq + fmt::Debug;

    /// Resolve a string table entry to a string object
    fn resolve_string(&mut self, index: StringIndex) -> Result<Self::Object, ResolveError>;

    /// Resolve a type, loading it if necessary
    fn resolve_type(&mut self, index: TypeIndex) -> Result<Self::Object, ResolveError>;

    /// Look up an already loaded type; never loads, allocates or fails
    fn lookup_type(&self, index: TypeIndex) -> Option<Self::Object>;

    /// Resolve a method reference to a method (or constructor) object
    fn resolve_method(&mut self, index: MethodIndex) -> Result<Self::Object, ResolveError>;

    /// Resolve a field reference to a field object
    fn resolve_field(&mut self, index: FieldIndex) -> Result<Self::Object, ResolveError>;

    /// Resolve an enum constant: the value of the static field at `index`,
    /// initializing its declaring class first
    fn resolve_enum(&mut self, index: FieldIndex) -> Result<Self::Object, ResolveError>;

    /// The class declaring the method at `index`
    fn declaring_class(&mut self, index: MethodIndex) -> Result<Self::Object, ResolveError>;

    /// Placeholder standing in for a type that could not be resolved
    fn type_not_present(&mut self, descriptor: &str) -> Self::Object;

    /// Whether `object` is a placeholder from [`Resolver::type_not_present`]
    fn is_type_not_present(&self, object: &Self::Object) -> bool;

    /// Box a primitive into a reference
    fn box_primitive(&mut self, value: Primitive) -> Self::Object;

    /// Declared type of the member `name` of an annotation class, or
    /// `None` if the class declares no such member
    fn annotation_member_type(
        &mut self,
        annotation_class: &Self::Object,
        name: &str,
    ) -> Option<ElementType>;

    /// Build an array object from fully materialized elements
    fn new_array(
        &mut self,
        element_type: &ElementType,
        elements: ArrayStore<Self::Object>,
    ) -> Result<Self::Object, ResolveError>;

    /// Build an annotation instance from fully materialized members
    fn new_annotation(
        &mut self,
        annotation_class: &Self::Object,
        members: Vec<AnnotationMember<Self::Object>>,
    ) -> Result<Self::Object, ResolveError>;

    /// Drop any failure left pending by a failed resolution
    fn clear_pending_failure(&mut self) {}

    /// Make the failure a type-not-present placeholder stands for pending
    /// again, for queries that report a missing class instead of returning
    /// the placeholder
    fn raise_type_not_present(&mut self, _placeholder: &Self::Object) {}
}
