//! Test helpers: an encoded value writer and an in-memory runtime

use crate::error::{ResolveError, SymbolKind};
use crate::materialize::ArrayStore;
use crate::resolver::{AnnotationMember, Resolver, StringTable};
use crate::types::{ElementType, FieldIndex, MethodIndex, StringIndex, TypeIndex};
use crate::value::{Primitive, ValueType, VALUE_ARG_SHIFT};
use rustc_hash::{FxHashMap, FxHashSet};

/// Writes encoded values using the narrowest legal width
#[derive(Debug, Default)]
pub struct ValueWriter {
    buffer: Vec<u8>,
}

impl ValueWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn uleb(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                return;
            }
            self.buffer.push(byte | 0x80);
        }
    }

    fn header(&mut self, value_type: ValueType, arg: u8) {
        self.buffer.push((arg << VALUE_ARG_SHIFT) | value_type.to_u8());
    }

    fn signed(&mut self, value_type: ValueType, value: i64) {
        let mut width = 1;
        while width < 8 {
            let shift = 64 - 8 * width;
            if (value << shift) >> shift == value {
                break;
            }
            width += 1;
        }
        self.sized(value_type, value as u64, width as usize);
    }

    fn unsigned(&mut self, value_type: ValueType, value: u64) {
        let mut width = 1;
        while width < 8 && value >> (8 * width) != 0 {
            width += 1;
        }
        self.sized(value_type, value, width);
    }

    fn right_justified(&mut self, value_type: ValueType, bits: u64, full_width: usize) {
        let mut width = full_width;
        while width > 1 && (bits >> (8 * (full_width - width))) & 0xff == 0 {
            width -= 1;
        }
        self.sized(value_type, bits >> (8 * (full_width - width)), width);
    }

    fn sized(&mut self, value_type: ValueType, value: u64, width: usize) {
        self.header(value_type, (width - 1) as u8);
        self.buffer
            .extend_from_slice(&value.to_le_bytes()[..width]);
    }

    pub fn byte(&mut self, value: i8) {
        self.signed(ValueType::Byte, i64::from(value));
    }

    pub fn short(&mut self, value: i16) {
        self.signed(ValueType::Short, i64::from(value));
    }

    pub fn char(&mut self, value: u16) {
        self.unsigned(ValueType::Char, u64::from(value));
    }

    pub fn int(&mut self, value: i32) {
        self.signed(ValueType::Int, i64::from(value));
    }

    pub fn long(&mut self, value: i64) {
        self.signed(ValueType::Long, value);
    }

    pub fn float(&mut self, value: f32) {
        self.right_justified(ValueType::Float, u64::from(value.to_bits()), 4);
    }

    pub fn double(&mut self, value: f64) {
        self.right_justified(ValueType::Double, value.to_bits(), 8);
    }

    pub fn boolean(&mut self, value: bool) {
        self.header(ValueType::Boolean, u8::from(value));
    }

    pub fn null(&mut self) {
        self.header(ValueType::Null, 0);
    }

    pub fn reference(&mut self, value_type: ValueType, index: u32) {
        self.unsigned(value_type, u64::from(index));
    }

    pub fn string(&mut self, index: u32) {
        self.reference(ValueType::String, index);
    }

    pub fn type_ref(&mut self, index: u32) {
        self.reference(ValueType::Type, index);
    }

    pub fn method_ref(&mut self, index: u32) {
        self.reference(ValueType::Method, index);
    }

    pub fn field_ref(&mut self, index: u32) {
        self.reference(ValueType::Field, index);
    }

    pub fn enum_ref(&mut self, index: u32) {
        self.reference(ValueType::Enum, index);
    }

    pub fn array(&mut self, size: u32, f: impl FnOnce(&mut Self)) {
        self.header(ValueType::Array, 0);
        self.uleb(size);
        f(self);
    }

    /// An annotation value: header byte followed by the body
    pub fn annotation(&mut self, type_index: u32, count: u32, f: impl FnOnce(&mut Self)) {
        self.header(ValueType::Annotation, 0);
        self.body(type_index, count, f);
    }

    /// A bare annotation body, as stored in an annotation item
    pub fn body(&mut self, type_index: u32, count: u32, f: impl FnOnce(&mut Self)) {
        self.uleb(type_index);
        self.uleb(count);
        f(self);
    }

    pub fn element(&mut self, name: u32, f: impl FnOnce(&mut Self)) {
        self.uleb(name);
        f(self);
    }
}

/// Live objects produced by [`TestRuntime`]
#[derive(Debug, Clone, PartialEq)]
pub enum Obj {
    Str(String),
    Class(String),
    TypeNotPresent(String),
    Method(String),
    Field(String),
    EnumConstant(String),
    Boxed(Primitive),
    Array(ElementType, ArrayStore<Obj>),
    Annotation(String, Vec<(String, Option<Obj>)>),
}

/// String and type tables
#[derive(Debug, Clone, Default)]
pub struct TestStrings {
    strings: Vec<String>,
    types: Vec<String>,
}

impl StringTable for TestStrings {
    fn string(&self, index: StringIndex) -> Option<&str> {
        self.strings.get(index.0 as usize).map(String::as_str)
    }

    fn type_descriptor(&self, index: TypeIndex) -> Option<&str> {
        self.types.get(index.0 as usize).map(String::as_str)
    }
}

/// In-memory runtime: tables, loadable classes and member references
#[derive(Debug, Default)]
pub struct TestRuntime {
    pub strings: TestStrings,
    unloadable: FxHashSet<TypeIndex>,
    annotation_members: FxHashMap<String, Vec<(String, ElementType)>>,
    methods: Vec<(TypeIndex, String)>,
    fields: Vec<String>,
    pub resolve_calls: usize,
    pub pending_failure: bool,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(&mut self, text: &str) -> u32 {
        if let Some(pos) = self.strings.strings.iter().position(|s| s == text) {
            return pos as u32;
        }
        self.strings.strings.push(text.to_string());
        (self.strings.strings.len() - 1) as u32
    }

    pub fn add_type(&mut self, descriptor: &str) -> TypeIndex {
        if let Some(pos) = self.strings.types.iter().position(|s| s == descriptor) {
            return TypeIndex(pos as u32);
        }
        self.strings.types.push(descriptor.to_string());
        TypeIndex((self.strings.types.len() - 1) as u32)
    }

    pub fn add_unloadable_type(&mut self, descriptor: &str) -> TypeIndex {
        let index = self.add_type(descriptor);
        self.unloadable.insert(index);
        index
    }

    /// Register an annotation class with (member name, member descriptor) pairs
    pub fn add_annotation_class(&mut self, descriptor: &str, members: &[(&str, &str)]) -> TypeIndex {
        let members = members
            .iter()
            .map(|(name, ty)| (name.to_string(), ElementType::from_descriptor(ty)))
            .collect();
        self.annotation_members
            .insert(descriptor.to_string(), members);
        self.add_type(descriptor)
    }

    pub fn add_method(&mut self, declaring_class: TypeIndex, name: &str) -> MethodIndex {
        self.methods.push((declaring_class, name.to_string()));
        MethodIndex((self.methods.len() - 1) as u32)
    }

    pub fn add_field(&mut self, name: &str) -> FieldIndex {
        self.fields.push(name.to_string());
        FieldIndex((self.fields.len() - 1) as u32)
    }

    fn fail(&mut self, kind: SymbolKind, index: u32) -> ResolveError {
        self.pending_failure = true;
        ResolveError::Unresolved { kind, index }
    }
}

impl Resolver for TestRuntime {
    type Object = Obj;

    fn resolve_string(&mut self, index: StringIndex) -> Result<Obj, ResolveError> {
        self.resolve_calls += 1;
        match self.strings.string(index) {
            Some(text) => Ok(Obj::Str(text.to_string())),
            None => Err(self.fail(SymbolKind::String, index.0)),
        }
    }

    fn resolve_type(&mut self, index: TypeIndex) -> Result<Obj, ResolveError> {
        self.resolve_calls += 1;
        match self.lookup_type(index) {
            Some(class) => Ok(class),
            None => Err(self.fail(SymbolKind::Type, index.0)),
        }
    }

    fn lookup_type(&self, index: TypeIndex) -> Option<Obj> {
        if self.unloadable.contains(&index) {
            return None;
        }
        self.strings
            .type_descriptor(index)
            .map(|d| Obj::Class(d.to_string()))
    }

    fn resolve_method(&mut self, index: MethodIndex) -> Result<Obj, ResolveError> {
        self.resolve_calls += 1;
        match self.methods.get(index.0 as usize) {
            Some((_, name)) => Ok(Obj::Method(name.clone())),
            None => Err(self.fail(SymbolKind::Method, index.0)),
        }
    }

    fn resolve_field(&mut self, index: FieldIndex) -> Result<Obj, ResolveError> {
        self.resolve_calls += 1;
        match self.fields.get(index.0 as usize) {
            Some(name) => Ok(Obj::Field(name.clone())),
            None => Err(self.fail(SymbolKind::Field, index.0)),
        }
    }

    fn resolve_enum(&mut self, index: FieldIndex) -> Result<Obj, ResolveError> {
        self.resolve_calls += 1;
        match self.fields.get(index.0 as usize) {
            Some(name) => Ok(Obj::EnumConstant(name.clone())),
            None => Err(self.fail(SymbolKind::Enum, index.0)),
        }
    }

    fn declaring_class(&mut self, index: MethodIndex) -> Result<Obj, ResolveError> {
        let declaring = match self.methods.get(index.0 as usize) {
            Some((class, _)) => *class,
            None => return Err(self.fail(SymbolKind::Method, index.0)),
        };
        self.resolve_type(declaring)
    }

    fn type_not_present(&mut self, descriptor: &str) -> Obj {
        Obj::TypeNotPresent(descriptor.to_string())
    }

    fn is_type_not_present(&self, object: &Obj) -> bool {
        matches!(object, Obj::TypeNotPresent(_))
    }

    fn raise_type_not_present(&mut self, _placeholder: &Obj) {
        self.pending_failure = true;
    }

    fn box_primitive(&mut self, value: Primitive) -> Obj {
        Obj::Boxed(value)
    }

    fn annotation_member_type(&mut self, annotation_class: &Obj, name: &str) -> Option<ElementType> {
        let Obj::Class(descriptor) = annotation_class else {
            return None;
        };
        self.annotation_members
            .get(descriptor)?
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, ty)| ty.clone())
    }

    fn new_array(
        &mut self,
        element_type: &ElementType,
        elements: ArrayStore<Obj>,
    ) -> Result<Obj, ResolveError> {
        Ok(Obj::Array(element_type.clone(), elements))
    }

    fn new_annotation(
        &mut self,
        annotation_class: &Obj,
        members: Vec<AnnotationMember<Obj>>,
    ) -> Result<Obj, ResolveError> {
        let Obj::Class(descriptor) = annotation_class else {
            return Err(ResolveError::Construction(format!("{annotation_class:?}")));
        };
        let members = members.into_iter().map(|m| (m.name, m.value)).collect();
        Ok(Obj::Annotation(descriptor.clone(), members))
    }

    fn clear_pending_failure(&mut self) {
        self.pending_failure = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_minimal_widths() {
        let mut w = ValueWriter::new();
        w.int(-2);
        w.type_ref(300);
        w.float(2.0);
        w.double(1.0);
        w.char(0xffff);
        assert_eq!(
            w.bytes(),
            &[0x04, 0xfe, 0x38, 0x2c, 0x01, 0x10, 0x40, 0x31, 0xf0, 0x3f, 0x23, 0xff, 0xff]
        );
    }

    #[test]
    fn test_writer_uleb() {
        let mut w = ValueWriter::new();
        w.uleb(0x3b4);
        assert_eq!(w.bytes(), &[0xb4, 0x07]);
    }
}
