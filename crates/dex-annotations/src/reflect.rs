//! Member-facing annotation queries
//!
//! [`AnnotationReader`] answers the questions reflection asks about one
//! class and its members. Format violations are returned as errors;
//! unresolvable symbols and policy mismatches become absent results.

use crate::codec::decode_value;
use crate::config::AnnotationConfig;
use crate::element::{find_element, find_element_in};
use crate::error::{DecodeError, MaterializeError};
use crate::item::{AnnotationItem, AnnotationSet, AnnotationsDirectory, Visibility};
use crate::materialize::{AnnotationValue, Materializer, ResultStyle};
use crate::reader::EncodedReader;
use crate::resolver::{string_data, Resolver, StringTable};
use crate::search::{find_loaded_record_by_type, find_record_by_type, search_annotation_set};
use crate::types::{ElementType, FieldIndex, MethodIndex, StringIndex};
use crate::value::{Primitive, RawValue, ValueHeader, ValueType};
use crate::visitor::{visit_annotation_set, AnnotationVisitor, VisitorStatus};

/// Default values of an annotation type's members
pub const ANNOTATION_DEFAULT: &str = "Ldalvik/annotation/AnnotationDefault;";
/// Lexically enclosing class of a member class
pub const ENCLOSING_CLASS: &str = "Ldalvik/annotation/EnclosingClass;";
/// Enclosing method of a local or anonymous class
pub const ENCLOSING_METHOD: &str = "Ldalvik/annotation/EnclosingMethod;";
/// Simple name and access flags of an inner class
pub const INNER_CLASS: &str = "Ldalvik/annotation/InnerClass;";
/// Member classes
pub const MEMBER_CLASSES: &str = "Ldalvik/annotation/MemberClasses;";
/// Parameter names and access flags
pub const METHOD_PARAMETERS: &str = "Ldalvik/annotation/MethodParameters;";
/// Nest host of a nest member
pub const NEST_HOST: &str = "Ldalvik/annotation/NestHost;";
/// Members of a nest
pub const NEST_MEMBERS: &str = "Ldalvik/annotation/NestMembers;";
/// Sealed class subclasses
pub const PERMITTED_SUBCLASSES: &str = "Ldalvik/annotation/PermittedSubclasses;";
/// Record component metadata
pub const RECORD: &str = "Ldalvik/annotation/Record;";
/// Generic signature fragments
pub const SIGNATURE: &str = "Ldalvik/annotation/Signature;";
/// JSR-45 debug extension text
pub const SOURCE_DEBUG_EXTENSION: &str = "Ldalvik/annotation/SourceDebugExtension;";
/// Declared exception types
pub const THROWS: &str = "Ldalvik/annotation/Throws;";

const STRING_ARRAY: &str = "[Ljava/lang/String;";
const CLASS_ARRAY: &str = "[Ljava/lang/Class;";
const INT_ARRAY: &str = "[I";

/// The annotated element a query refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    /// The class itself
    Class,
    /// A field of the class
    Field(FieldIndex),
    /// A method of the class
    Method(MethodIndex),
}

/// Name recorded by an `InnerClass` annotation
#[derive(Debug, Clone, PartialEq)]
pub enum InnerClassName<O> {
    /// The class is anonymous
    Anonymous,
    /// The simple name of the class
    Named(O),
}

/// Parameter metadata recorded by a `MethodParameters` annotation
#[derive(Debug, Clone, PartialEq)]
pub struct MethodParameters<O> {
    /// `String[]` of parameter names
    pub names: O,
    /// `int[]` of parameter access flags
    pub access_flags: O,
}

/// Turn a materialization result into a member-facing one
fn settle<T>(result: Result<T, MaterializeError>) -> Result<Option<T>, DecodeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MaterializeError::Decode(err)) => Err(err),
        Err(err) => {
            tracing::debug!(error = %err, "annotation value unavailable");
            Ok(None)
        }
    }
}

/// `class` unless it is a type-not-present placeholder, in which case its
/// failure is raised again and `None` is returned
fn present_class<R: Resolver>(resolver: &mut R, class: R::Object) -> Option<R::Object> {
    if resolver.is_type_not_present(&class) {
        resolver.raise_type_not_present(&class);
        return None;
    }
    Some(class)
}

/// The object held by `value` if it was encoded as `expected`
fn object_of<O>(value: Option<AnnotationValue<O>>, expected: ValueType) -> Option<O> {
    value
        .filter(|v| v.value_type == expected)
        .and_then(AnnotationValue::into_object)
}

/// Annotation queries over one class's annotations directory
pub struct AnnotationReader<'a, S: ?Sized> {
    strings: &'a S,
    directory: &'a AnnotationsDirectory<'a>,
    config: AnnotationConfig,
}

impl<'a, S: StringTable + ?Sized> AnnotationReader<'a, S> {
    /// Create a reader over a class's directory
    pub fn new(
        strings: &'a S,
        directory: &'a AnnotationsDirectory<'a>,
        config: AnnotationConfig,
    ) -> Self {
        Self {
            strings,
            directory,
            config,
        }
    }

    /// The configuration in effect
    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    fn set(&self, member: Member) -> Option<&'a AnnotationSet<'a>> {
        match member {
            Member::Class => self.directory.class_set(),
            Member::Field(field) => self.directory.field_set(field),
            Member::Method(method) => self.directory.method_set(method),
        }
    }

    fn system_item(
        &self,
        member: Member,
        descriptor: &str,
    ) -> Result<Option<AnnotationItem<'a>>, DecodeError> {
        match self.set(member) {
            Some(set) => {
                search_annotation_set(self.strings, set, descriptor, Visibility::System, &self.config)
            }
            None => Ok(None),
        }
    }

    fn element_reader(
        &self,
        item: &AnnotationItem<'a>,
        name: &str,
    ) -> Result<Option<EncodedReader<'a>>, DecodeError> {
        let offset = find_element(self.strings, item.annotation, name)?;
        Ok(offset.map(|pos| EncodedReader::at(item.annotation, pos)))
    }

    /// Materialize element `element_name` of the System annotation
    /// `descriptor` on `member`. `array_type` is the declared type of the
    /// element when it is an array.
    fn system_value<R: Resolver>(
        &self,
        resolver: &mut R,
        member: Member,
        descriptor: &str,
        element_name: &str,
        array_type: Option<&ElementType>,
        style: ResultStyle,
    ) -> Result<Option<AnnotationValue<R::Object>>, DecodeError> {
        let Some(item) = self.system_item(member, descriptor)? else {
            return Ok(None);
        };
        let Some(mut reader) = self.element_reader(&item, element_name)? else {
            return Ok(None);
        };
        let component = array_type.and_then(ElementType::component);
        let mut materializer = Materializer::new(self.strings, resolver);
        settle(materializer.materialize(&mut reader, component.as_ref(), style))
    }

    fn system_array<R: Resolver>(
        &self,
        resolver: &mut R,
        member: Member,
        descriptor: &str,
        element_name: &str,
        array_type: &str,
    ) -> Result<Option<R::Object>, DecodeError> {
        let array_type = ElementType::from_descriptor(array_type);
        let value = self.system_value(
            resolver,
            member,
            descriptor,
            element_name,
            Some(&array_type),
            ResultStyle::AllObjects,
        )?;
        Ok(object_of(value, ValueType::Array))
    }

    /// Decode element `element_name` of a System annotation without
    /// resolving anything
    fn system_raw(
        &self,
        descriptor: &str,
        element_name: &str,
    ) -> Result<Option<RawValue>, DecodeError> {
        let Some(item) = self.system_item(Member::Class, descriptor)? else {
            return Ok(None);
        };
        match self.element_reader(&item, element_name)? {
            Some(mut reader) => Ok(Some(decode_value(&mut reader)?)),
            None => Ok(None),
        }
    }

    // ===== Runtime-visible annotations =====

    /// Whether `member` carries a Runtime annotation with `descriptor`
    pub fn is_annotation_present(
        &self,
        member: Member,
        descriptor: &str,
    ) -> Result<bool, DecodeError> {
        self.is_annotation_present_with_visibility(member, descriptor, Visibility::Runtime)
    }

    /// Whether `member` carries an annotation with `descriptor` whose
    /// visibility is compatible with `visibility`
    pub fn is_annotation_present_with_visibility(
        &self,
        member: Member,
        descriptor: &str,
        visibility: Visibility,
    ) -> Result<bool, DecodeError> {
        match self.set(member) {
            Some(set) => Ok(
                search_annotation_set(self.strings, set, descriptor, visibility, &self.config)?
                    .is_some(),
            ),
            None => Ok(false),
        }
    }

    /// Whether `member` carries a Runtime annotation whose already loaded
    /// type is `annotation_class`. Never loads a class.
    pub fn is_annotation_class_present<R: Resolver>(
        &self,
        resolver: &R,
        member: Member,
        annotation_class: &R::Object,
    ) -> Result<bool, DecodeError> {
        self.is_annotation_class_present_with_visibility(
            resolver,
            member,
            annotation_class,
            Visibility::Runtime,
        )
    }

    /// Like [`Self::is_annotation_class_present`] at `visibility`
    pub fn is_annotation_class_present_with_visibility<R: Resolver>(
        &self,
        resolver: &R,
        member: Member,
        annotation_class: &R::Object,
        visibility: Visibility,
    ) -> Result<bool, DecodeError> {
        match self.set(member) {
            Some(set) => Ok(find_loaded_record_by_type(
                resolver,
                set,
                visibility,
                annotation_class,
                &self.config,
            )?
            .is_some()),
            None => Ok(false),
        }
    }

    /// The Runtime annotation of type `annotation_class` on `member`
    #[tracing::instrument(level = "debug", skip_all, fields(member = ?member))]
    pub fn annotation<R: Resolver>(
        &self,
        resolver: &mut R,
        member: Member,
        annotation_class: &R::Object,
    ) -> Result<Option<R::Object>, DecodeError> {
        match self.set(member) {
            Some(set) => self.annotation_in_set(resolver, set, annotation_class),
            None => Ok(None),
        }
    }

    fn annotation_in_set<R: Resolver>(
        &self,
        resolver: &mut R,
        set: &AnnotationSet<'a>,
        annotation_class: &R::Object,
    ) -> Result<Option<R::Object>, DecodeError> {
        let item = find_record_by_type(
            resolver,
            set,
            Visibility::Runtime,
            annotation_class,
            &self.config,
        )?;
        let Some(item) = item else {
            return Ok(None);
        };
        let mut materializer = Materializer::new(self.strings, resolver);
        settle(materializer.materialize_annotation(&mut item.reader()))
    }

    /// All Runtime annotations on `member`, in stored order.
    ///
    /// Only exact Runtime visibility counts here. Annotations whose class
    /// cannot be resolved are left out. `None` means a member failed to
    /// resolve and the resolver holds the failure.
    #[tracing::instrument(level = "debug", skip_all, fields(member = ?member))]
    pub fn annotations<R: Resolver>(
        &self,
        resolver: &mut R,
        member: Member,
    ) -> Result<Option<Vec<R::Object>>, DecodeError> {
        self.process_set(resolver, self.set(member))
    }

    fn process_set<R: Resolver>(
        &self,
        resolver: &mut R,
        set: Option<&AnnotationSet<'a>>,
    ) -> Result<Option<Vec<R::Object>>, DecodeError> {
        let Some(set) = set else {
            return Ok(Some(Vec::new()));
        };
        let mut annotations = Vec::with_capacity(set.len());
        let mut materializer = Materializer::new(self.strings, resolver);
        for item in set.iter().filter(|item| item.visibility == Visibility::Runtime) {
            match materializer.materialize_annotation(&mut item.reader()) {
                Ok(annotation) => annotations.push(annotation),
                Err(MaterializeError::Decode(err)) => return Err(err),
                Err(err) if err.is_quiet() => {
                    tracing::debug!(error = %err, "dropping annotation");
                }
                Err(err) => {
                    tracing::debug!(error = %err, "failed to build annotation set");
                    return Ok(None);
                }
            }
        }
        Ok(Some(annotations))
    }

    // ===== Parameters =====

    /// Runtime annotations of every parameter of `method`; one list per
    /// parameter slot
    #[tracing::instrument(level = "debug", skip_all, fields(method = %method))]
    pub fn parameter_annotations<R: Resolver>(
        &self,
        resolver: &mut R,
        method: MethodIndex,
    ) -> Result<Option<Vec<Vec<R::Object>>>, DecodeError> {
        let Some(sets) = self.directory.parameter_sets(method) else {
            return Ok(None);
        };
        let mut result = Vec::with_capacity(sets.len());
        for set in sets {
            match self.process_set(resolver, set.as_ref())? {
                Some(annotations) => result.push(annotations),
                None => return Ok(None),
            }
        }
        Ok(Some(result))
    }

    /// Number of parameter slots recorded for `method`
    pub fn annotated_parameter_count(&self, method: MethodIndex) -> usize {
        self.directory
            .parameter_sets(method)
            .map_or(0, |sets| sets.len())
    }

    /// The Runtime annotation of type `annotation_class` on parameter
    /// `index` of `method`
    pub fn parameter_annotation<R: Resolver>(
        &self,
        resolver: &mut R,
        method: MethodIndex,
        index: usize,
        annotation_class: &R::Object,
    ) -> Result<Option<R::Object>, DecodeError> {
        let set = self
            .directory
            .parameter_sets(method)
            .and_then(|sets| sets.get(index))
            .and_then(Option::as_ref);
        match set {
            Some(set) => self.annotation_in_set(resolver, set, annotation_class),
            None => Ok(None),
        }
    }

    // ===== Annotation classes =====

    /// Default value of the annotation member `method_name`, read from
    /// this annotation class's `AnnotationDefault`
    #[tracing::instrument(level = "debug", skip_all, fields(method_name = %method_name))]
    pub fn annotation_default_value<R: Resolver>(
        &self,
        resolver: &mut R,
        method_name: &str,
        return_type: &ElementType,
    ) -> Result<Option<R::Object>, DecodeError> {
        let Some(item) = self.system_item(Member::Class, ANNOTATION_DEFAULT)? else {
            return Ok(None);
        };
        let Some(mut reader) = self.element_reader(&item, "value")? else {
            return Ok(None);
        };
        if ValueHeader::read(&mut reader)?.value_type != ValueType::Annotation {
            return Ok(None);
        }
        if find_element_in(self.strings, &mut reader, method_name)?.is_none() {
            return Ok(None);
        }
        let component = return_type.component();
        let mut materializer = Materializer::new(self.strings, resolver);
        let value = settle(materializer.materialize(
            &mut reader,
            component.as_ref(),
            ResultStyle::AllObjects,
        ))?;
        Ok(value.and_then(AnnotationValue::into_object))
    }

    // ===== System annotations =====

    /// Generic signature of `member` as a `String[]`
    pub fn signature<R: Resolver>(
        &self,
        resolver: &mut R,
        member: Member,
    ) -> Result<Option<R::Object>, DecodeError> {
        self.system_array(resolver, member, SIGNATURE, "value", STRING_ARRAY)
    }

    /// Declared exception types of `method` as a `Class[]`
    pub fn exception_types<R: Resolver>(
        &self,
        resolver: &mut R,
        method: MethodIndex,
    ) -> Result<Option<R::Object>, DecodeError> {
        self.system_array(resolver, Member::Method(method), THROWS, "value", CLASS_ARRAY)
    }

    /// Member classes of the class as a `Class[]`
    pub fn member_classes<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        self.system_array(resolver, Member::Class, MEMBER_CLASSES, "value", CLASS_ARRAY)
    }

    /// Value of `EnclosingClass`, placeholder included
    fn enclosing_class_value<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        let value = self.system_value(
            resolver,
            Member::Class,
            ENCLOSING_CLASS,
            "value",
            None,
            ResultStyle::AllObjects,
        )?;
        Ok(object_of(value, ValueType::Type))
    }

    /// The class this class is a member of; a missing class leaves the
    /// resolver's failure pending
    pub fn declaring_class<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        let class = self.enclosing_class_value(resolver)?;
        Ok(class.and_then(|c| present_class(resolver, c)))
    }

    /// The immediately enclosing class: the declaring class, or else the
    /// class declaring the enclosing method.
    ///
    /// A missing declaring class is reported through the resolver's
    /// pending failure; there is no fallback in that case.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn enclosing_class<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        if let Some(class) = self.enclosing_class_value(resolver)? {
            return Ok(present_class(resolver, class));
        }

        let value = self.system_value(
            resolver,
            Member::Class,
            ENCLOSING_METHOD,
            "value",
            None,
            ResultStyle::Raw,
        )?;
        let method = match value {
            Some(v) if v.value_type == ValueType::Method => v.as_index(),
            _ => None,
        };
        let Some(method) = method else {
            return Ok(None);
        };
        match resolver.declaring_class(MethodIndex(method)) {
            Ok(class) => Ok(Some(class)),
            Err(err) => {
                tracing::debug!(error = %err, "unable to resolve enclosing method");
                Ok(None)
            }
        }
    }

    /// The method this class is declared in
    pub fn enclosing_method<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        let value = self.system_value(
            resolver,
            Member::Class,
            ENCLOSING_METHOD,
            "value",
            None,
            ResultStyle::AllObjects,
        )?;
        Ok(object_of(value, ValueType::Method))
    }

    /// Name from the `InnerClass` annotation; `None` if the class is not an
    /// inner class
    pub fn inner_class<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<InnerClassName<R::Object>>, DecodeError> {
        let value = self.system_value(
            resolver,
            Member::Class,
            INNER_CLASS,
            "name",
            None,
            ResultStyle::AllObjects,
        )?;
        Ok(match value {
            Some(v) if v.value_type == ValueType::Null => Some(InnerClassName::Anonymous),
            Some(v) if v.value_type == ValueType::String => {
                v.into_object().map(InnerClassName::Named)
            }
            _ => None,
        })
    }

    /// Access flags from the `InnerClass` annotation
    pub fn inner_class_flags(&self) -> Result<Option<u32>, DecodeError> {
        match self.system_raw(INNER_CLASS, "accessFlags")? {
            Some(RawValue::Primitive(Primitive::Int(flags))) => Ok(Some(flags as u32)),
            _ => Ok(None),
        }
    }

    /// Text of the `SourceDebugExtension` annotation
    pub fn source_debug_extension(&self) -> Result<Option<&'a str>, DecodeError> {
        match self.system_raw(SOURCE_DEBUG_EXTENSION, "value")? {
            Some(RawValue::Reference {
                value_type: ValueType::String,
                index,
            }) => Ok(Some(string_data(self.strings, StringIndex(index))?)),
            _ => Ok(None),
        }
    }

    /// Host of the nest this class belongs to; a missing host leaves the
    /// resolver's failure pending
    pub fn nest_host<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        let value = self.system_value(
            resolver,
            Member::Class,
            NEST_HOST,
            "host",
            None,
            ResultStyle::AllObjects,
        )?;
        Ok(object_of(value, ValueType::Type).and_then(|c| present_class(resolver, c)))
    }

    /// Members of the nest hosted by this class as a `Class[]`
    pub fn nest_members<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        self.system_array(resolver, Member::Class, NEST_MEMBERS, "classes", CLASS_ARRAY)
    }

    /// Permitted subclasses of this sealed class as a `Class[]`
    pub fn permitted_subclasses<R: Resolver>(
        &self,
        resolver: &mut R,
    ) -> Result<Option<R::Object>, DecodeError> {
        self.system_array(
            resolver,
            Member::Class,
            PERMITTED_SUBCLASSES,
            "value",
            CLASS_ARRAY,
        )
    }

    /// Element `element_name` of the `Record` annotation, whose declared
    /// type is `array_type`
    pub fn record_element<R: Resolver>(
        &self,
        resolver: &mut R,
        element_name: &str,
        array_type: &ElementType,
    ) -> Result<Option<R::Object>, DecodeError> {
        let value = self.system_value(
            resolver,
            Member::Class,
            RECORD,
            element_name,
            Some(array_type),
            ResultStyle::PrimitivesOrObjects,
        )?;
        Ok(value.and_then(AnnotationValue::into_object))
    }

    /// Parameter names and access flags of `method`; both must be present
    pub fn method_parameters<R: Resolver>(
        &self,
        resolver: &mut R,
        method: MethodIndex,
    ) -> Result<Option<MethodParameters<R::Object>>, DecodeError> {
        let member = Member::Method(method);
        let names = self.system_array(resolver, member, METHOD_PARAMETERS, "names", STRING_ARRAY)?;
        let Some(names) = names else {
            return Ok(None);
        };
        let access_flags =
            self.system_array(resolver, member, METHOD_PARAMETERS, "accessFlags", INT_ARRAY)?;
        Ok(access_flags.map(|access_flags| MethodParameters {
            names,
            access_flags,
        }))
    }

    // ===== Structural walk =====

    /// Walk every class annotation with `visitor`
    pub fn visit_class_annotations<V: AnnotationVisitor + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> Result<VisitorStatus, DecodeError> {
        match self.directory.class_set() {
            Some(set) => visit_annotation_set(self.strings, set, visitor),
            None => Ok(VisitorStatus::Continue),
        }
    }
}
