//! Shared fixtures for integration tests
//!
//! `Enc` always writes full-width payloads, which is legal but never what
//! a minimizing encoder produces; the unit tests cover the narrow forms.

#![allow(dead_code)]

use dex_annotations::{
    AnnotationMember, ArrayStore, ElementType, FieldIndex, MethodIndex, Primitive, ResolveError,
    Resolver, StringIndex, StringTable, SymbolKind, TypeIndex, ValueType,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Full-width encoder for annotation bodies
#[derive(Default)]
pub struct Enc(pub Vec<u8>);

impl Enc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uleb(&mut self, mut value: u32) -> &mut Self {
        while value >= 0x80 {
            self.0.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.0.push(value as u8);
        self
    }

    fn wide(&mut self, value_type: ValueType, bytes: &[u8]) -> &mut Self {
        self.0.push((((bytes.len() - 1) as u8) << 5) | value_type.to_u8());
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn int(&mut self, value: i32) -> &mut Self {
        self.wide(ValueType::Int, &value.to_le_bytes())
    }

    pub fn long(&mut self, value: i64) -> &mut Self {
        self.wide(ValueType::Long, &value.to_le_bytes())
    }

    pub fn float(&mut self, value: f32) -> &mut Self {
        self.wide(ValueType::Float, &value.to_bits().to_le_bytes())
    }

    pub fn index(&mut self, value_type: ValueType, index: u32) -> &mut Self {
        self.wide(value_type, &index.to_le_bytes())
    }

    pub fn boolean(&mut self, value: bool) -> &mut Self {
        self.0.push((u8::from(value) << 5) | ValueType::Boolean.to_u8());
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.0.push(ValueType::Null.to_u8());
        self
    }

    pub fn array(&mut self, size: u32) -> &mut Self {
        self.0.push(ValueType::Array.to_u8());
        self.uleb(size)
    }

    pub fn annotation(&mut self, type_index: TypeIndex, count: u32) -> &mut Self {
        self.0.push(ValueType::Annotation.to_u8());
        self.body(type_index, count)
    }

    pub fn body(&mut self, type_index: TypeIndex, count: u32) -> &mut Self {
        self.uleb(type_index.0).uleb(count)
    }

    pub fn name(&mut self, name: StringIndex) -> &mut Self {
        self.uleb(name.0)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

/// Objects handed out by [`Runtime`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Class(String),
    Missing(String),
    Boxed(Primitive),
    Method(String),
    Field(String),
    Enum(String),
    Array(ElementType, ArrayStore<Value>),
    Annotation(String, Vec<(String, Option<Value>)>),
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    strings: Vec<String>,
    types: Vec<String>,
}

impl StringTable for Tables {
    fn string(&self, index: StringIndex) -> Option<&str> {
        self.strings.get(index.0 as usize).map(String::as_str)
    }

    fn type_descriptor(&self, index: TypeIndex) -> Option<&str> {
        self.types.get(index.0 as usize).map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct Runtime {
    pub tables: Tables,
    missing: FxHashSet<TypeIndex>,
    members: FxHashMap<String, Vec<(String, ElementType)>>,
    methods: Vec<(TypeIndex, String)>,
    fields: Vec<String>,
    pub pending: bool,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&mut self, text: &str) -> StringIndex {
        let tables = &mut self.tables;
        let pos = tables.strings.iter().position(|s| s == text).unwrap_or_else(|| {
            tables.strings.push(text.to_string());
            tables.strings.len() - 1
        });
        StringIndex(pos as u32)
    }

    pub fn class(&mut self, descriptor: &str) -> TypeIndex {
        let tables = &mut self.tables;
        let pos = tables.types.iter().position(|s| s == descriptor).unwrap_or_else(|| {
            tables.types.push(descriptor.to_string());
            tables.types.len() - 1
        });
        TypeIndex(pos as u32)
    }

    pub fn missing_class(&mut self, descriptor: &str) -> TypeIndex {
        let index = self.class(descriptor);
        self.missing.insert(index);
        index
    }

    pub fn annotation_class(&mut self, descriptor: &str, members: &[(&str, &str)]) -> TypeIndex {
        self.members.insert(
            descriptor.to_string(),
            members
                .iter()
                .map(|(n, t)| (n.to_string(), ElementType::from_descriptor(t)))
                .collect(),
        );
        self.class(descriptor)
    }

    pub fn method(&mut self, owner: TypeIndex, name: &str) -> MethodIndex {
        self.methods.push((owner, name.to_string()));
        MethodIndex(self.methods.len() as u32 - 1)
    }

    pub fn field(&mut self, name: &str) -> FieldIndex {
        self.fields.push(name.to_string());
        FieldIndex(self.fields.len() as u32 - 1)
    }

    fn unresolved(&mut self, kind: SymbolKind, index: u32) -> ResolveError {
        self.pending = true;
        ResolveError::Unresolved { kind, index }
    }
}

impl Resolver for Runtime {
    type Object = Value;

    fn resolve_string(&mut self, index: StringIndex) -> Result<Value, ResolveError> {
        match self.tables.string(index) {
            Some(s) => Ok(Value::Str(s.to_string())),
            None => Err(self.unresolved(SymbolKind::String, index.0)),
        }
    }

    fn resolve_type(&mut self, index: TypeIndex) -> Result<Value, ResolveError> {
        self.lookup_type(index)
            .ok_or_else(|| self.unresolved(SymbolKind::Type, index.0))
    }

    fn lookup_type(&self, index: TypeIndex) -> Option<Value> {
        if self.missing.contains(&index) {
            return None;
        }
        self.tables
            .type_descriptor(index)
            .map(|d| Value::Class(d.to_string()))
    }

    fn resolve_method(&mut self, index: MethodIndex) -> Result<Value, ResolveError> {
        match self.methods.get(index.0 as usize) {
            Some((_, name)) => Ok(Value::Method(name.clone())),
            None => Err(self.unresolved(SymbolKind::Method, index.0)),
        }
    }

    fn resolve_field(&mut self, index: FieldIndex) -> Result<Value, ResolveError> {
        match self.fields.get(index.0 as usize) {
            Some(name) => Ok(Value::Field(name.clone())),
            None => Err(self.unresolved(SymbolKind::Field, index.0)),
        }
    }

    fn resolve_enum(&mut self, index: FieldIndex) -> Result<Value, ResolveError> {
        match self.fields.get(index.0 as usize) {
            Some(name) => Ok(Value::Enum(name.clone())),
            None => Err(self.unresolved(SymbolKind::Enum, index.0)),
        }
    }

    fn declaring_class(&mut self, index: MethodIndex) -> Result<Value, ResolveError> {
        match self.methods.get(index.0 as usize) {
            Some(&(owner, _)) => self.resolve_type(owner),
            None => Err(self.unresolved(SymbolKind::Method, index.0)),
        }
    }

    fn type_not_present(&mut self, descriptor: &str) -> Value {
        Value::Missing(descriptor.to_string())
    }

    fn is_type_not_present(&self, object: &Value) -> bool {
        matches!(object, Value::Missing(_))
    }

    fn raise_type_not_present(&mut self, _placeholder: &Value) {
        self.pending = true;
    }

    fn box_primitive(&mut self, value: Primitive) -> Value {
        Value::Boxed(value)
    }

    fn annotation_member_type(&mut self, annotation_class: &Value, name: &str) -> Option<ElementType> {
        match annotation_class {
            Value::Class(descriptor) => self
                .members
                .get(descriptor)?
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, ty)| ty.clone()),
            _ => None,
        }
    }

    fn new_array(
        &mut self,
        element_type: &ElementType,
        elements: ArrayStore<Value>,
    ) -> Result<Value, ResolveError> {
        Ok(Value::Array(element_type.clone(), elements))
    }

    fn new_annotation(
        &mut self,
        annotation_class: &Value,
        members: Vec<AnnotationMember<Value>>,
    ) -> Result<Value, ResolveError> {
        match annotation_class {
            Value::Class(descriptor) => Ok(Value::Annotation(
                descriptor.clone(),
                members.into_iter().map(|m| (m.name, m.value)).collect(),
            )),
            other => Err(ResolveError::Construction(format!("annotation of {other:?}"))),
        }
    }

    fn clear_pending_failure(&mut self) {
        self.pending = false;
    }
}
