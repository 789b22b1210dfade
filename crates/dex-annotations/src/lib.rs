//! DEX Annotation Decoding
//!
//! This crate decodes the encoded annotation values stored in a DEX
//! container and turns them into runtime objects through a caller-supplied
//! [`Resolver`]. It provides:
//!
//! - a codec for encoded values, with decode and skip modes that always
//!   consume the same bytes,
//! - element lookup inside an annotation body and annotation search inside
//!   an annotation set,
//! - a materializer with three result styles ([`ResultStyle`]),
//! - a depth-tracked structural visitor,
//! - member-facing queries over a class's annotations ([`AnnotationReader`]).
//!
//! The container's bytes are only ever borrowed.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod compiler;
pub mod config;
pub mod element;
pub mod error;
pub mod item;
pub mod materialize;
pub mod reader;
pub mod reflect;
pub mod resolver;
pub mod search;
pub mod types;
pub mod value;
pub mod visitor;

#[cfg(test)]
mod testing;

pub use codec::{decode_value, skip_value};
pub use config::AnnotationConfig;
pub use element::find_element;
pub use error::{ConfigError, DecodeError, MaterializeError, ResolveError, SymbolKind};
pub use item::{AnnotationItem, AnnotationSet, AnnotationsDirectory, Visibility};
pub use materialize::{AnnotationValue, ArrayStore, Materializer, Payload, ResultStyle};
pub use reader::EncodedReader;
pub use reflect::{AnnotationReader, InnerClassName, Member, MethodParameters};
pub use resolver::{AnnotationMember, Resolver, StringTable};
pub use search::{
    find_loaded_record_by_type, find_record_by_type, is_visibility_compatible,
    search_annotation_set,
};
pub use types::{ElementType, FieldIndex, MethodIndex, PrimitiveType, StringIndex, TypeIndex};
pub use value::{Primitive, RawAnnotation, RawValue, ValueType};
pub use visitor::{
    visit_annotation_body, visit_annotation_set, AnnotationVisitor, ElementKey, VisitedValue,
    VisitorStatus,
};
