//! Annotation checks used by the compiler and the class linker
//!
//! These only compare descriptors and never resolve anything, so they are
//! safe to run before any class is loaded.

use crate::config::AnnotationConfig;
use crate::error::DecodeError;
use crate::item::{AnnotationSet, AnnotationsDirectory, Visibility};
use crate::resolver::StringTable;
use crate::search::search_annotation_set;
use crate::types::{FieldIndex, MethodIndex};

/// `@NeverCompile`
pub const NEVER_COMPILE: &str = "Ldalvik/annotation/optimization/NeverCompile;";
/// `@NeverInline`
pub const NEVER_INLINE: &str = "Ldalvik/annotation/optimization/NeverInline;";
/// `@FastNative`
pub const FAST_NATIVE: &str = "Ldalvik/annotation/optimization/FastNative;";
/// `@CriticalNative`
pub const CRITICAL_NATIVE: &str = "Ldalvik/annotation/optimization/CriticalNative;";
/// `@ReachabilitySensitive`
pub const REACHABILITY_SENSITIVE: &str = "Ldalvik/annotation/optimization/ReachabilitySensitive;";
/// `@DeadReferenceSafe`
pub const DEAD_REFERENCE_SAFE: &str = "Ldalvik/annotation/optimization/DeadReferenceSafe;";

/// Access flag set on `@FastNative` methods
pub const ACC_FAST_NATIVE: u32 = 0x0008_0000;

/// Access flag set on `@CriticalNative` methods
pub const ACC_CRITICAL_NATIVE: u32 = 0x0020_0000;

fn is_present<S: StringTable + ?Sized>(
    strings: &S,
    set: Option<&AnnotationSet<'_>>,
    descriptor: &str,
    visibility: Visibility,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    match set {
        Some(set) => Ok(search_annotation_set(strings, set, descriptor, visibility, config)?.is_some()),
        None => Ok(false),
    }
}

/// Whether `method` carries `@NeverCompile`
pub fn method_is_never_compile<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    method: MethodIndex,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    let set = directory.method_set(method);
    is_present(strings, set, NEVER_COMPILE, Visibility::Build, config)
}

/// Whether `method` carries `@NeverInline`
pub fn method_is_never_inline<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    method: MethodIndex,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    let set = directory.method_set(method);
    is_present(strings, set, NEVER_INLINE, Visibility::Build, config)
}

/// Access flags implied by `@FastNative` / `@CriticalNative` on `method`.
///
/// A method may carry at most one of the two.
pub fn native_access_flags<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    method: MethodIndex,
    config: &AnnotationConfig,
) -> Result<u32, DecodeError> {
    let set = directory.method_set(method);
    let mut flags = 0;
    if is_present(strings, set, FAST_NATIVE, Visibility::Build, config)? {
        flags |= ACC_FAST_NATIVE;
    }
    if is_present(strings, set, CRITICAL_NATIVE, Visibility::Build, config)? {
        flags |= ACC_CRITICAL_NATIVE;
    }
    if flags == ACC_FAST_NATIVE | ACC_CRITICAL_NATIVE {
        return Err(DecodeError::ConflictingNativeAnnotations);
    }
    Ok(flags)
}

/// Whether `field` carries `@ReachabilitySensitive`
pub fn field_is_reachability_sensitive<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    field: FieldIndex,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    let set = directory.field_set(field);
    is_present(strings, set, REACHABILITY_SENSITIVE, Visibility::Runtime, config)
}

/// Whether `method` carries `@ReachabilitySensitive`
pub fn method_is_reachability_sensitive<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    method: MethodIndex,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    let set = directory.method_set(method);
    is_present(strings, set, REACHABILITY_SENSITIVE, Visibility::Runtime, config)
}

/// Whether the class carries `@DeadReferenceSafe`
pub fn has_dead_reference_safe<S: StringTable + ?Sized>(
    strings: &S,
    directory: &AnnotationsDirectory<'_>,
    config: &AnnotationConfig,
) -> Result<bool, DecodeError> {
    let set = directory.class_set();
    is_present(strings, set, DEAD_REFERENCE_SAFE, Visibility::Runtime, config)
}
